// Test harness for a temporary git repository holding a dbt project
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const UDF_MACRO: &str = "{% macro create_udfs() %}\r\ncreate or replace function normalize(x string)\r\nreturns string language python as $$\r\n!!python/normalize.py!!\r\n$$;\r\n{% endmacro %}\r\n";
pub const PLAIN_MACRO: &str = "{% macro cents_to_dollars(col) %}({{ col }} / 100)::numeric(16, 2){% endmacro %}\n";
pub const UDF_SOURCE: &str = "def normalize(x):\n    return x.strip().lower()\n";

/// A committed repository with `dbt/macros`, `dbt/profiles` and a Python
/// source referenced from one macro. Removed when dropped.
pub struct TestHarness {
    temp_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        let harness = Self {
            temp_dir: tempfile::tempdir()?,
        };
        harness.git(&["init", "--quiet"])?;
        harness.git(&["config", "user.name", "Ada Lovelace"])?;
        harness.git(&["config", "user.email", "ada@example.com"])?;
        harness.git(&["config", "commit.gpgsign", "false"])?;

        harness.create_file("dbt/macros/udfs.sql", UDF_MACRO)?;
        harness.create_file("dbt/macros/money.sql", PLAIN_MACRO)?;
        harness.create_file("dbt/profiles/profiles.yml", "shop:\n  target: snowflake\n")?;
        harness.create_file("dbt/.gitignore", "target/\n")?;
        harness.create_file("python/normalize.py", UDF_SOURCE)?;
        harness.commit_all("Initial dbt project")?;
        Ok(harness)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn create_file(&self, relative_path: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.path().join(relative_path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn read_file(&self, relative_path: &str) -> Result<String> {
        std::fs::read_to_string(self.path().join(relative_path))
            .with_context(|| format!("reading {relative_path}"))
    }

    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.git(&["add", "--all"])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    /// Paths staged in the index relative to HEAD.
    pub fn staged_files(&self) -> Result<Vec<String>> {
        let output = self.git(&["diff", "--cached", "--name-only"])?;
        Ok(output.lines().map(str::to_string).collect())
    }

    /// Paths modified in the working tree but not staged.
    pub fn unstaged_files(&self) -> Result<Vec<String>> {
        let output = self.git(&["diff", "--name-only"])?;
        Ok(output.lines().map(str::to_string).collect())
    }

    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git").args(args).current_dir(self.path()).output()?;
        if !output.status.success() {
            bail!("git {} failed: {}", args.join(" "), String::from_utf8_lossy(&output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
