//! Persisted dbt run-state: where it lives, how it gets there, and what the
//! last run looked like.

pub mod archiver;
pub mod locator;
pub mod run_results;

pub use archiver::{archive_state, STATE_ARTIFACTS};
pub use locator::{state_path, WarehouseIdentity};
pub use run_results::{format_duration, RunResults, UnitResult};
