use crate::external::{CommandError, GitError};
use std::path::PathBuf;
use thiserror::Error;

/// Every fatal condition a run or explain can end with.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Required environment variable {variable} is not set")]
    ConfigurationMissing { variable: &'static str },

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Interpolation source {} referenced from {} could not be read: {source}", .source_path.display(), .template.display())]
    MissingInterpolationSource {
        template: PathBuf,
        source_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {} contains interpolation directives but is not tracked by git; commit it first so it can be restored after the run", .path.display())]
    UntrackedTemplate { path: PathBuf },

    #[error("`{command}` failed with exit code {exit_code}")]
    RunFailed { command: String, exit_code: i32 },

    #[error("dbt did not produce the expected state artifact {}", .path.display())]
    StateArtifactMissing { path: PathBuf },

    #[error("Version control error: {0}")]
    VersionControl(#[from] GitError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {}: {source}", .path.display())]
    ArtifactParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not read operator confirmation: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("No compiled query for model {model} under {}", .dir.display())]
    CompiledModelNotFound { model: String, dir: PathBuf },

    #[error("Warehouse query failed: {message}")]
    Warehouse { message: String },
}

impl WorkflowError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| WorkflowError::Io { path, source }
    }
}
