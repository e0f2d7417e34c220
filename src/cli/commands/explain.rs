use super::Command;
use crate::config::Settings;
use crate::explain::ModelExplainer;
use crate::external::{CommandExecutor, DbtCli, ProcessCommandExecutor, SnowSqlConnector};
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct ExplainCommand<'a> {
    settings: &'a Settings,
    model: String,
}

impl<'a> ExplainCommand<'a> {
    pub fn new(settings: &'a Settings, model: impl Into<String>) -> Self {
        Self {
            settings,
            model: model.into(),
        }
    }
}

impl Command for ExplainCommand<'_> {
    async fn execute(&self) -> Result<()> {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessCommandExecutor);
        let layout = &self.settings.layout;
        let tools = &self.settings.tools;

        let dbt = DbtCli::new(executor.clone(), tools, layout.dbt_dir());
        let connector = SnowSqlConnector::new(
            executor,
            &tools.snowsql_executable,
            self.settings.credentials.clone(),
            layout.root(),
        );

        let plan = ModelExplainer::new(layout, &dbt, &connector)
            .explain(&self.model)
            .await
            .with_context(|| format!("Could not explain model {}", self.model))?;

        println!("📋 Query plan for {}:", self.model);
        print!("{}", plan.render());
        Ok(())
    }
}
