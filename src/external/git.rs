//! Git command abstractions
//!
//! The versioned-file store the run workflow relies on: staging persisted
//! state for the next commit, discarding uncommitted template edits, and
//! asking who last touched a file.

use super::command::{CommandError, CommandExecutor, CommandInvocation};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository not found or not a git repository: {}", .root.display())]
    RepositoryNotFound { root: PathBuf },
    #[error("Command execution error: {source}")]
    CommandError {
        #[from]
        source: CommandError,
    },
    #[error("`{command}` exited with status {exit_code}: {stderr}")]
    GitCommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

/// Operations on the versioned file store backing the repository.
///
/// All calls block until git exits and are never retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionedFileStore: Send + Sync {
    /// Mark `path` for inclusion in the next commit.
    async fn stage(&self, path: &Path) -> Result<(), GitError>;

    /// Restore `path` to its last committed content, discarding local edits.
    async fn revert(&self, path: &Path) -> Result<(), GitError>;

    /// Whether `path`, or anything below it, is known to the store.
    async fn is_tracked(&self, path: &Path) -> Result<bool, GitError>;

    /// Name of the author of the last commit touching `path`, if any.
    async fn last_author(&self, path: &Path) -> Result<Option<String>, GitError>;
}

/// Real Git implementation
pub struct GitClient {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    repository_root: PathBuf,
}

impl GitClient {
    pub fn new(executor: Arc<dyn CommandExecutor>, repository_root: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            program: "git".to_string(),
            repository_root: repository_root.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn invocation(&self, args: &[&str]) -> CommandInvocation {
        CommandInvocation::new(&self.program, &self.repository_root).args(args.iter().copied())
    }

    async fn execute_git_command(&self, args: &[&str]) -> Result<String, GitError> {
        let invocation = self.invocation(args);
        tracing::debug!(command = %invocation, "Running git");
        let output = self.executor.execute(&invocation).await?;

        if !output.success() {
            return Err(self.classify_git_error(&invocation, output.status_code, &output.stderr));
        }

        Ok(output.stdout.trim().to_string())
    }

    fn classify_git_error(&self, invocation: &CommandInvocation, exit_code: i32, stderr: &str) -> GitError {
        if stderr.contains("not a git repository") {
            GitError::RepositoryNotFound {
                root: self.repository_root.clone(),
            }
        } else {
            GitError::GitCommandFailed {
                command: invocation.command_line(),
                exit_code,
                stderr: stderr.trim().to_string(),
            }
        }
    }
}

#[async_trait]
impl VersionedFileStore for GitClient {
    async fn stage(&self, path: &Path) -> Result<(), GitError> {
        let path = path.to_string_lossy();
        self.execute_git_command(&["add", path.as_ref()]).await?;
        tracing::info!(path = %path, "Staged for commit");
        Ok(())
    }

    async fn revert(&self, path: &Path) -> Result<(), GitError> {
        let path = path.to_string_lossy();
        self.execute_git_command(&["checkout", "--", path.as_ref()]).await?;
        tracing::info!(path = %path, "Reverted to last committed content");
        Ok(())
    }

    async fn is_tracked(&self, path: &Path) -> Result<bool, GitError> {
        let path = path.to_string_lossy();
        let invocation = self.invocation(&["ls-files", "--error-unmatch", "--", path.as_ref()]);
        tracing::debug!(command = %invocation, "Running git");
        let output = self.executor.execute(&invocation).await?;

        match output.status_code {
            0 => Ok(true),
            1 if output.stderr.contains("did not match") => Ok(false),
            code => Err(self.classify_git_error(&invocation, code, &output.stderr)),
        }
    }

    async fn last_author(&self, path: &Path) -> Result<Option<String>, GitError> {
        let path = path.to_string_lossy();
        let author = self
            .execute_git_command(&["log", "-1", "--pretty=format:%an", "--", path.as_ref()])
            .await?;
        Ok(if author.is_empty() { None } else { Some(author) })
    }
}
