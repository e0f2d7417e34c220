//! Base command execution abstraction
//!
//! Every child process this crate starts (dbt, git, snowsql) goes through
//! [`CommandExecutor`], so the workflow can be driven in tests without
//! spawning anything.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;

/// Where a child's stdout/stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collected into [`CommandOutput`].
    Captured,
    /// Inherited from this process, so the operator sees it live.
    Streamed,
}

/// A fully described child process invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub mode: OutputMode,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            env: Vec::new(),
            mode: OutputMode::Captured,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable for the child only. Values are never
    /// included in `Debug`/`Display` output.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn streamed(mut self) -> Self {
        self.mode = OutputMode::Streamed;
        self
    }

    /// The command line as an operator would type it.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

impl fmt::Debug for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(key, _)| key.as_str()).collect();
        f.debug_struct("CommandInvocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("env", &env_keys)
            .field("mode", &self.mode)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, or -1 when the child was terminated by a signal.
    pub status_code: i32,
    /// Empty when the invocation was streamed.
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Error, Clone)]
pub enum CommandError {
    #[error("Command not found: {command}")]
    CommandNotFound { command: String },
    #[error("Failed to run `{command}`: {message}")]
    Io { command: String, message: String },
}

/// Trait for executing external commands
///
/// Implementations block (asynchronously) until the child exits; a non-zero
/// exit status is reported through [`CommandOutput`], not as an error.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<CommandOutput, CommandError>;
}

/// Real implementation using tokio::process
pub struct ProcessCommandExecutor;

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<CommandOutput, CommandError> {
        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit());

        let map_spawn_error = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::CommandNotFound {
                    command: invocation.program.clone(),
                }
            } else {
                CommandError::Io {
                    command: invocation.command_line(),
                    message: e.to_string(),
                }
            }
        };

        tracing::debug!(command = %invocation, cwd = %invocation.cwd.display(), "Spawning child process");

        match invocation.mode {
            OutputMode::Streamed => {
                let status = command
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(map_spawn_error)?;
                Ok(CommandOutput {
                    status_code: status.code().unwrap_or(-1),
                    ..CommandOutput::default()
                })
            }
            OutputMode::Captured => {
                let output = command.output().await.map_err(map_spawn_error)?;
                Ok(CommandOutput {
                    status_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                })
            }
        }
    }
}
