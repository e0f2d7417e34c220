use super::Command;
use crate::config::Settings;
use crate::external::{CommandExecutor, DbtCli, GitClient, ProcessCommandExecutor};
use crate::workflows::{AutoApprove, RunOrchestrator, RunOutcome, TerminalPrompt};
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct RunCommand<'a> {
    settings: &'a Settings,
    selection: String,
    auto_approve: bool,
}

impl<'a> RunCommand<'a> {
    pub fn new(settings: &'a Settings, selection: impl Into<String>) -> Self {
        Self {
            settings,
            selection: selection.into(),
            auto_approve: false,
        }
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    fn orchestrator(&self) -> RunOrchestrator {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessCommandExecutor);
        let layout = &self.settings.layout;
        let tools = &self.settings.tools;

        let dbt = DbtCli::new(executor.clone(), tools, layout.dbt_dir());
        let git = GitClient::new(executor, layout.root()).with_program(&tools.git_executable);
        RunOrchestrator::new(layout.clone(), self.settings.credentials.identity(), dbt, Arc::new(git))
    }
}

impl Command for RunCommand<'_> {
    async fn execute(&self) -> Result<()> {
        let orchestrator = self.orchestrator();
        println!(
            "🎯 Target: {} (state in {})",
            self.settings.credentials.identity(),
            orchestrator.state_path().display()
        );

        let report = if self.auto_approve {
            orchestrator.execute(Some(self.selection.as_str()), &mut AutoApprove).await
        } else {
            orchestrator
                .execute(Some(self.selection.as_str()), &mut TerminalPrompt::stdio())
                .await
        }
        .context("dbt run did not complete")?;

        match report.outcome {
            RunOutcome::Completed {
                state_path,
                used_prior_state,
            } => {
                if !used_prior_state {
                    println!("🆕 First run for this database; full build performed");
                }
                println!("✅ dbt run complete. New state staged at {}", state_path.display());
                println!("💡 Commit it so the next run compares against this one");
            }
            RunOutcome::Declined => {
                println!("🛑 Aborted. Macros restored, existing state untouched");
            }
        }
        Ok(())
    }
}
