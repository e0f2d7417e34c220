use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const RUN_RESULTS_FILE: &str = "run_results.json";

/// Repository-relative locations of the dbt project and its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The dbt project directory; dbt is always invoked from here.
    pub fn dbt_dir(&self) -> PathBuf {
        self.root.join("dbt")
    }

    pub fn macros_dir(&self) -> PathBuf {
        self.dbt_dir().join("macros")
    }

    /// Where dbt writes fresh artifacts on every invocation.
    pub fn target_dir(&self) -> PathBuf {
        self.dbt_dir().join("target")
    }

    pub fn compiled_dir(&self) -> PathBuf {
        self.target_dir().join("compiled")
    }

    /// Parent of every persisted per-identity state directory.
    pub fn state_root(&self) -> PathBuf {
        self.dbt_dir().join("state")
    }
}
