//! Snowflake access through the `snowsql` CLI
//!
//! Only used to fetch query plans. The password travels in the child's
//! environment (`SNOWSQL_PWD`), never on the command line.

use super::command::{CommandExecutor, CommandInvocation};
use crate::config::WarehouseCredentials;
use crate::error::WorkflowError;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

/// Tabular result of an `EXPLAIN`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryPlan {
    /// Parse tab-separated output whose first non-empty line is the header.
    pub fn parse_tsv(output: &str) -> Self {
        let mut lines = output.lines().filter(|line| !line.trim().is_empty());
        let Some(header) = lines.next() else {
            return Self::default();
        };
        let columns: Vec<String> = header.split('\t').map(str::to_string).collect();
        let rows = lines
            .map(|line| {
                let mut cells: Vec<String> = line.split('\t').map(str::to_string).collect();
                if cells.len() < columns.len() {
                    cells.resize(columns.len(), String::new());
                }
                cells
            })
            .collect();
        Self { columns, rows }
    }

    /// Every row and column, left-aligned, with a header rule.
    pub fn render(&self) -> String {
        let width = self.columns.len().max(self.rows.iter().map(Vec::len).max().unwrap_or(0));
        let mut widths = vec![0usize; width];
        for row in std::iter::once(&self.columns).chain(self.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let render_row = |row: &[String]| {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| format!("{:w$}", row.get(i).map(String::as_str).unwrap_or(""), w = *w))
                .collect();
            cells.join("  ").trim_end().to_string()
        };

        let mut out = String::new();
        let _ = writeln!(out, "{}", render_row(&self.columns));
        let _ = writeln!(out, "{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
        for row in &self.rows {
            let _ = writeln!(out, "{}", render_row(row));
        }
        out
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WarehouseConnector: Send + Sync {
    /// Ask the warehouse for the execution plan of `query`.
    async fn explain(&self, query: &str) -> Result<QueryPlan, WorkflowError>;
}

pub struct SnowSqlConnector {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    credentials: WarehouseCredentials,
    cwd: PathBuf,
}

impl SnowSqlConnector {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        program: impl Into<String>,
        credentials: WarehouseCredentials,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            program: program.into(),
            credentials,
            cwd: cwd.into(),
        }
    }

    pub fn explain_invocation(&self, query: &str) -> CommandInvocation {
        let statement = format!("EXPLAIN {}", query.trim().trim_end_matches(';').trim_end());
        let creds = &self.credentials;
        CommandInvocation::new(&self.program, &self.cwd)
            .args(["-a", creds.account.as_str()])
            .args(["-u", creds.user.as_str()])
            .args(["-w", creds.warehouse.as_str()])
            .args(["-d", creds.database.as_str()])
            .args(["-s", creds.schema.as_str()])
            .args(["-r", creds.role.as_str()])
            .arg("-q")
            .arg(statement)
            .args([
                "-o",
                "output_format=tsv",
                "-o",
                "header=true",
                "-o",
                "friendly=false",
                "-o",
                "timing=false",
                "-o",
                "exit_on_error=true",
            ])
            .env("SNOWSQL_PWD", creds.password.as_str())
    }
}

#[async_trait]
impl WarehouseConnector for SnowSqlConnector {
    async fn explain(&self, query: &str) -> Result<QueryPlan, WorkflowError> {
        let invocation = self.explain_invocation(query);
        tracing::info!(account = %self.credentials.account, warehouse = %self.credentials.warehouse, "Requesting query plan");
        let output = self.executor.execute(&invocation).await?;

        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim()
            } else {
                output.stderr.trim()
            };
            return Err(WorkflowError::Warehouse {
                message: format!("{} exited with status {}: {}", self.program, output.status_code, detail),
            });
        }

        Ok(QueryPlan::parse_tsv(&output.stdout))
    }
}
