use crate::error::WorkflowError;
use crate::project::ProjectLayout;
use crate::state::WarehouseIdentity;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Optional per-repository tool settings file.
pub const SETTINGS_FILE: &str = "dbt-state.toml";

const ENV_PREFIX: &str = "DBT";

/// Everything a command needs, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: WarehouseCredentials,
    pub tools: ToolSettings,
    pub layout: ProjectLayout,
}

impl Settings {
    /// Load credentials from the process environment and tool settings from
    /// the repository root.
    pub fn load(repository_root: &Path) -> Result<Self, WorkflowError> {
        Ok(Self {
            credentials: WarehouseCredentials::from_environment()?,
            tools: ToolSettings::load(repository_root)?,
            layout: ProjectLayout::new(repository_root),
        })
    }
}

/// Snowflake connection values sourced from `DBT_*` environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct WarehouseCredentials {
    pub account: String,
    pub database: String,
    pub schema: String,
    pub user: String,
    pub password: String,
    pub warehouse: String,
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawCredentials {
    snowflake_account: Option<String>,
    database: Option<String>,
    schema: Option<String>,
    user: Option<String>,
    password: Option<String>,
    warehouse: Option<String>,
    role: Option<String>,
}

fn required(value: Option<String>, variable: &'static str) -> Result<String, WorkflowError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(WorkflowError::ConfigurationMissing { variable }),
    }
}

impl WarehouseCredentials {
    pub fn from_environment() -> Result<Self, WorkflowError> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`from_environment`](Self::from_environment) but reading the
    /// given variables instead of the process environment.
    pub fn from_env_map(vars: config::Map<String, String>) -> Result<Self, WorkflowError> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn from_source(source: Environment) -> Result<Self, WorkflowError> {
        let raw: RawCredentials = Config::builder().add_source(source).build()?.try_deserialize()?;

        Ok(Self {
            account: required(raw.snowflake_account, "DBT_SNOWFLAKE_ACCOUNT")?,
            database: required(raw.database, "DBT_DATABASE")?,
            schema: required(raw.schema, "DBT_SCHEMA")?,
            user: required(raw.user, "DBT_USER")?,
            password: required(raw.password, "DBT_PASSWORD")?,
            warehouse: required(raw.warehouse, "DBT_WAREHOUSE")?,
            role: required(raw.role, "DBT_ROLE")?,
        })
    }

    pub fn identity(&self) -> WarehouseIdentity {
        WarehouseIdentity::new(&self.account, &self.database, &self.schema)
    }
}

impl fmt::Debug for WarehouseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseCredentials")
            .field("account", &self.account)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish()
    }
}

/// Names and locations of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolSettings {
    pub dbt_executable: String,
    /// Relative to the dbt project directory.
    pub profiles_dir: String,
    pub git_executable: String,
    pub snowsql_executable: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            dbt_executable: "dbt".to_string(),
            profiles_dir: "profiles".to_string(),
            git_executable: "git".to_string(),
            snowsql_executable: "snowsql".to_string(),
        }
    }
}

impl ToolSettings {
    /// Defaults, overridden by `dbt-state.toml` in the repository root when present.
    pub fn load(repository_root: &Path) -> Result<Self, WorkflowError> {
        let path = repository_root.join(SETTINGS_FILE);
        let mut builder = Config::builder();
        if path.exists() {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        Ok(builder.build()?.try_deserialize()?)
    }
}
