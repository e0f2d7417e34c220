// Stand-in for the dbt CLI; every other program runs for real
use async_trait::async_trait;
use dbt_state_runner::external::{CommandError, CommandExecutor, CommandInvocation, CommandOutput, ProcessCommandExecutor};
use std::path::PathBuf;
use std::sync::Mutex;

pub const RUN_RESULTS: &str = r#"{
  "metadata": {"generated_at": "2026-10-19T06:30:00.000000Z"},
  "elapsed_time": 75.25,
  "results": [
    {"unique_id": "model.shop.stg_orders", "execution_time": 1.5},
    {"unique_id": "model.shop.orders", "execution_time": 61.0}
  ]
}"#;

/// Answers `dbt run` by writing artifacts into `target/` under the working
/// directory, with a configurable exit code.
pub struct ScriptedDbt {
    exit_code: i32,
    write_artifacts: bool,
    runs: Mutex<Vec<CommandInvocation>>,
    macros_during_run: Mutex<Vec<String>>,
    inner: ProcessCommandExecutor,
}

impl ScriptedDbt {
    pub fn succeeding() -> Self {
        Self {
            exit_code: 0,
            write_artifacts: true,
            runs: Mutex::new(Vec::new()),
            macros_during_run: Mutex::new(Vec::new()),
            inner: ProcessCommandExecutor,
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            exit_code,
            write_artifacts: false,
            ..Self::succeeding()
        }
    }

    pub fn runs(&self) -> Vec<CommandInvocation> {
        self.runs.lock().unwrap().clone()
    }

    /// Content of `macros/udfs.sql` as dbt saw it, one entry per run.
    pub fn macros_during_run(&self) -> Vec<String> {
        self.macros_during_run.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedDbt {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<CommandOutput, CommandError> {
        if invocation.program != "dbt" {
            return self.inner.execute(invocation).await;
        }

        self.runs.lock().unwrap().push(invocation.clone());
        let macro_path = invocation.cwd.join("macros/udfs.sql");
        if let Ok(content) = std::fs::read_to_string(&macro_path) {
            self.macros_during_run.lock().unwrap().push(content);
        }

        if self.write_artifacts {
            let target: PathBuf = invocation.cwd.join("target");
            std::fs::create_dir_all(&target).unwrap();
            let manifest = format!("{{\"invocation\": {}}}", self.runs.lock().unwrap().len());
            std::fs::write(target.join("manifest.json"), manifest).unwrap();
            std::fs::write(target.join("run_results.json"), RUN_RESULTS).unwrap();
        }

        Ok(CommandOutput {
            status_code: self.exit_code,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
