use crate::external::DEFAULT_SELECTION;
use crate::telemetry::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "dbt-state-runner")]
#[command(about = "Run dbt incrementally against state persisted per Snowflake database")]
#[command(long_about = "dbt-state-runner interpolates source files into dbt macros, runs dbt against the \
                       state left by the previous run on the same account/database/schema, and stages \
                       the new state in git. Macros are always restored afterwards.")]
pub struct Cli {
    /// Repository containing the `dbt/` project
    #[arg(short = 'r', long, global = true, default_value = ".", help = "Root of the repository holding the dbt project")]
    pub repository_root: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, help = "Format of diagnostic output on stderr")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run dbt against the previously persisted state and stage the new state
    Run {
        /// dbt node selection expression
        #[arg(long, default_value = DEFAULT_SELECTION, help = "dbt selection passed as --select")]
        selection: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long, help = "Continue without asking for confirmation")]
        yes: bool,
    },
    /// Show the warehouse query plan for a compiled model
    Explain {
        /// Model name, without the .sql extension
        #[arg(long, help = "Name of the dbt model to explain")]
        model: String,
    },
}
