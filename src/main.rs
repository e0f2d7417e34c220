use anyhow::{Context, Result};
use clap::Parser;
use dbt_state_runner::cli::commands::{explain::ExplainCommand, load_settings, run::RunCommand, Command};
use dbt_state_runner::cli::{Cli, Commands};
use dbt_state_runner::telemetry::init_telemetry;

fn main() -> Result<()> {
    if std::path::Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env")?;
    }

    let cli = Cli::parse();
    init_telemetry(cli.log_format)?;
    let settings = load_settings(&cli.repository_root)?;

    tokio::runtime::Runtime::new()?.block_on(async {
        match &cli.command {
            Commands::Run { selection, yes } => {
                RunCommand::new(&settings, selection.as_str())
                    .with_auto_approve(*yes)
                    .execute()
                    .await
            }
            Commands::Explain { model } => ExplainCommand::new(&settings, model.as_str()).execute().await,
        }
    })
}
