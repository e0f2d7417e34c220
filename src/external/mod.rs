//! External tool abstractions
//!
//! dbt, git and snowsql are only ever reached through [`CommandExecutor`],
//! so every adapter here can be exercised with a scripted executor.

pub mod command;
pub mod dbt;
pub mod git;
pub mod snowflake;

pub use command::{CommandError, CommandExecutor, CommandInvocation, CommandOutput, OutputMode, ProcessCommandExecutor};
pub use dbt::{DbtCli, DEFAULT_SELECTION};
pub use git::{GitClient, GitError, VersionedFileStore};
pub use snowflake::{QueryPlan, SnowSqlConnector, WarehouseConnector};
