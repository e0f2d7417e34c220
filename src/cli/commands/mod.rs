use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::Path;

pub mod explain;
pub mod run;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Resolve the repository root and load settings for it.
pub fn load_settings(repository_root: &Path) -> Result<Settings> {
    let root = repository_root
        .canonicalize()
        .with_context(|| format!("Repository root {} is not accessible", repository_root.display()))?;
    Settings::load(&root).context("Failed to load configuration")
}
