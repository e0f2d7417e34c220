use crate::error::WorkflowError;
use crate::project::{MANIFEST_FILE, RUN_RESULTS_FILE};
use std::path::{Path, PathBuf};

/// The state artifacts dbt writes on every run and that get persisted.
pub const STATE_ARTIFACTS: [&str; 2] = [MANIFEST_FILE, RUN_RESULTS_FILE];

/// Copy the freshly produced artifacts from `target_dir` into `state_path`,
/// creating it if needed. Both artifacts are checked before anything is
/// copied. Returns the archived file paths.
pub async fn archive_state(target_dir: &Path, state_path: &Path) -> Result<Vec<PathBuf>, WorkflowError> {
    for artifact in STATE_ARTIFACTS {
        let source = target_dir.join(artifact);
        let present = tokio::fs::try_exists(&source).await.map_err(WorkflowError::io(&source))?;
        if !present {
            return Err(WorkflowError::StateArtifactMissing { path: source });
        }
    }

    tokio::fs::create_dir_all(state_path)
        .await
        .map_err(WorkflowError::io(state_path))?;

    let mut archived = Vec::with_capacity(STATE_ARTIFACTS.len());
    for artifact in STATE_ARTIFACTS {
        let source = target_dir.join(artifact);
        let destination = state_path.join(artifact);
        tokio::fs::copy(&source, &destination)
            .await
            .map_err(WorkflowError::io(&destination))?;
        archived.push(destination);
    }

    tracing::info!(state_path = %state_path.display(), "Archived dbt state artifacts");
    Ok(archived)
}
