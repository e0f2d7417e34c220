// dbt State Runner Library - incremental dbt runs with per-database state
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod error;
pub mod explain;
pub mod external;
pub mod interpolation;
pub mod project;
pub mod shutdown;
pub mod state;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::{Settings, ToolSettings, WarehouseCredentials};
pub use error::WorkflowError;
pub use explain::{find_compiled_model, ModelExplainer};
pub use external::{CommandExecutor, CommandInvocation, CommandOutput, DbtCli, GitClient, ProcessCommandExecutor, VersionedFileStore};
pub use interpolation::{interpolate_macros, InterpolationReport};
pub use project::ProjectLayout;
pub use state::{archive_state, state_path, RunResults, WarehouseIdentity};
pub use telemetry::{create_run_span, generate_correlation_id, init_telemetry, LogFormat};
pub use workflows::{AutoApprove, Confirmation, MacroScope, RunOrchestrator, RunOutcome, RunPhase, RunReport, TerminalPrompt};
