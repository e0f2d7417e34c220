//! Query plans for compiled models
//!
//! The model is compiled with dbt, its SQL is located under
//! `target/compiled`, and the warehouse is asked for an `EXPLAIN` of it.

use crate::error::WorkflowError;
use crate::external::{DbtCli, QueryPlan, WarehouseConnector};
use crate::project::ProjectLayout;
use crate::telemetry::generate_correlation_id;
use std::path::{Path, PathBuf};
use tracing::Instrument;

pub struct ModelExplainer<'a> {
    layout: &'a ProjectLayout,
    dbt: &'a DbtCli,
    connector: &'a dyn WarehouseConnector,
}

impl<'a> ModelExplainer<'a> {
    pub fn new(layout: &'a ProjectLayout, dbt: &'a DbtCli, connector: &'a dyn WarehouseConnector) -> Self {
        Self { layout, dbt, connector }
    }

    pub async fn explain(&self, model: &str) -> Result<QueryPlan, WorkflowError> {
        let span = tracing::info_span!("explain", model = model, correlation.id = %generate_correlation_id());

        async move {
            self.dbt.compile().await?;

            let compiled = find_compiled_model(&self.layout.compiled_dir(), model).await?;
            tracing::info!(path = %compiled.display(), "Found compiled SQL");
            let sql = tokio::fs::read_to_string(&compiled)
                .await
                .map_err(WorkflowError::io(&compiled))?;

            let plan = self.connector.explain(&sql).await?;
            tracing::info!(rows = plan.rows.len(), "Received query plan");
            Ok(plan)
        }
        .instrument(span)
        .await
    }
}

/// First `<model>.sql` under `compiled_dir`, walking directories top-down in
/// name order and checking a directory's own files before its children.
pub async fn find_compiled_model(compiled_dir: &Path, model: &str) -> Result<PathBuf, WorkflowError> {
    let not_found = || WorkflowError::CompiledModelNotFound {
        model: model.to_string(),
        dir: compiled_dir.to_path_buf(),
    };
    if !tokio::fs::try_exists(compiled_dir)
        .await
        .map_err(WorkflowError::io(compiled_dir))?
    {
        return Err(not_found());
    }

    let file_name = format!("{model}.sql");
    let mut pending = vec![compiled_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(WorkflowError::io(&dir))?;
        let mut subdirs = Vec::new();
        let mut found = false;

        while let Some(entry) = entries.next_entry().await.map_err(WorkflowError::io(&dir))? {
            let file_type = entry.file_type().await.map_err(WorkflowError::io(entry.path()))?;
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else if entry.file_name() == file_name.as_str() {
                found = true;
            }
        }

        if found {
            return Ok(dir.join(&file_name));
        }
        subdirs.sort();
        pending.extend(subdirs.into_iter().rev());
    }

    Err(not_found())
}
