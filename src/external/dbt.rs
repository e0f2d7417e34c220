//! dbt CLI invocations
//!
//! dbt is always run from the project directory with its output streamed to
//! the operator's console. A non-zero exit is fatal and never retried: the
//! run may already have mutated the warehouse.

use super::command::{CommandExecutor, CommandInvocation};
use crate::config::ToolSettings;
use crate::error::WorkflowError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Selection used when the caller does not supply one.
pub const DEFAULT_SELECTION: &str = "state:modified+";

pub struct DbtCli {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    profiles_dir: String,
    project_dir: PathBuf,
}

impl DbtCli {
    pub fn new(executor: Arc<dyn CommandExecutor>, tools: &ToolSettings, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            program: tools.dbt_executable.clone(),
            profiles_dir: tools.profiles_dir.clone(),
            project_dir: project_dir.into(),
        }
    }

    /// `dbt run -x`, compared against `prior_state` when one is given.
    /// Without prior state the run is a full, state-free build.
    pub fn run_invocation(&self, selection: Option<&str>, prior_state: Option<&Path>) -> CommandInvocation {
        let mut invocation = CommandInvocation::new(&self.program, &self.project_dir)
            .args(["run", "-x", "--profiles-dir", self.profiles_dir.as_str()]);

        if let Some(state) = prior_state {
            invocation = invocation.arg("--state").arg(state.to_string_lossy());
        }
        if let Some(selection) = selection.filter(|s| !s.is_empty()) {
            invocation = invocation.arg("--select").arg(selection);
        }
        invocation.streamed()
    }

    pub async fn run(&self, selection: Option<&str>, prior_state: Option<&Path>) -> Result<(), WorkflowError> {
        let invocation = self.run_invocation(selection, prior_state);
        tracing::info!(
            command = %invocation,
            selection = selection.unwrap_or(""),
            incremental = prior_state.is_some(),
            "Running dbt"
        );
        self.execute(invocation).await
    }

    pub async fn compile(&self) -> Result<(), WorkflowError> {
        let invocation = CommandInvocation::new(&self.program, &self.project_dir)
            .args(["compile", "--profiles-dir", self.profiles_dir.as_str()])
            .streamed();
        tracing::info!(command = %invocation, "Compiling dbt project");
        self.execute(invocation).await
    }

    async fn execute(&self, invocation: CommandInvocation) -> Result<(), WorkflowError> {
        let output = self.executor.execute(&invocation).await?;
        if !output.success() {
            tracing::error!(command = %invocation, exit_code = output.status_code, "dbt failed");
            return Err(WorkflowError::RunFailed {
                command: invocation.command_line(),
                exit_code: output.status_code,
            });
        }
        Ok(())
    }
}
