//! Shared fixtures for the integration tests
#![allow(dead_code)]

pub mod scripted_dbt;
pub mod test_harness;

pub use scripted_dbt::ScriptedDbt;
pub use test_harness::TestHarness;
