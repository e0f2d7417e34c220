use crate::state::WarehouseIdentity;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines on stderr
    #[default]
    Text,
    /// One JSON object per event, with span context
    Json,
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// level.
pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?,
    }

    Ok(())
}

/// Generate a correlation ID for linking the events of one invocation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping a whole run or explain against one warehouse identity.
pub fn create_run_span(
    operation: &str,
    identity: &WarehouseIdentity,
    selection: Option<&str>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "dbt_state_runner",
        operation = operation,
        warehouse.account = %identity.account,
        warehouse.database = %identity.database,
        warehouse.schema = %identity.schema,
        selection = selection,
        correlation.id = correlation_id,
    )
}
