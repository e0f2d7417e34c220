use crate::error::WorkflowError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

/// The parts of dbt's `run_results.json` the run summary needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunResults {
    /// Wall-clock seconds for the whole invocation.
    pub elapsed_time: f64,
    #[serde(default)]
    pub results: Vec<UnitResult>,
    #[serde(default)]
    pub metadata: Option<RunMetadata>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitResult {
    pub unique_id: String,
    pub execution_time: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunMetadata {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl RunResults {
    pub async fn load(path: &Path) -> Result<Self, WorkflowError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(WorkflowError::io(path))?;
        Self::parse(&raw).map_err(|source| WorkflowError::ArtifactParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Units ordered slowest first. Ties keep their original order.
    pub fn units_by_duration(&self) -> Vec<&UnitResult> {
        let mut units: Vec<&UnitResult> = self.results.iter().collect();
        units.sort_by(|a, b| b.execution_time.total_cmp(&a.execution_time));
        units
    }

    /// Human-readable report of the run, one unit per line.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        if let Some(generated_at) = self.metadata.as_ref().and_then(|m| m.generated_at) {
            let _ = writeln!(out, "Last run finished at: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        let _ = writeln!(out, "Total run time: {}", format_duration(self.elapsed_time));
        let _ = writeln!(out, "Models updated during last run and execution time:");
        for unit in self.units_by_duration() {
            let _ = writeln!(out, "{:40} {}", unit.unique_id, format_duration(unit.execution_time));
        }
        out
    }
}

/// Formats seconds as `H:MM:SS`, with a `.ffffff` suffix for fractional
/// seconds and an `N day(s), ` prefix past 24 hours. Negative input renders
/// as zero.
pub fn format_duration(seconds: f64) -> String {
    const MICROS_PER_SECOND: i64 = 1_000_000;
    const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

    let micros = if seconds.is_finite() {
        (seconds * MICROS_PER_SECOND as f64).round().max(0.0) as i64
    } else {
        0
    };

    let days = micros / MICROS_PER_DAY;
    let within_day = micros % MICROS_PER_DAY;
    let hours = within_day / (3_600 * MICROS_PER_SECOND);
    let minutes = (within_day / (60 * MICROS_PER_SECOND)) % 60;
    let secs = (within_day / MICROS_PER_SECOND) % 60;
    let fraction = within_day % MICROS_PER_SECOND;

    let mut out = String::new();
    if days > 0 {
        let _ = write!(out, "{days} day{}, ", if days == 1 { "" } else { "s" });
    }
    let _ = write!(out, "{hours}:{minutes:02}:{secs:02}");
    if fraction > 0 {
        let _ = write!(out, ".{fraction:06}");
    }
    out
}
