// Run lifecycle: interpolate, resolve prior state, confirm, run, archive,
// stage, and always revert the interpolated macros on the way out.

use super::prompt::Confirmation;
use super::scope::MacroScope;
use crate::error::WorkflowError;
use crate::external::{DbtCli, VersionedFileStore};
use crate::interpolation::{interpolate_macros, templates_with_directives};
use crate::project::{ProjectLayout, MANIFEST_FILE, RUN_RESULTS_FILE};
use crate::shutdown::InterruptGuard;
use crate::state::{archive_state, state_path, RunResults, WarehouseIdentity};
use crate::telemetry::{create_run_span, generate_correlation_id};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Interpolated,
    StatePathResolved,
    ConfirmationPending,
    Running,
    Aborted,
    Archived,
    Staged,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { state_path: PathBuf, used_prior_state: bool },
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Every phase visited, in order, starting at `Init`.
    pub phases: Vec<RunPhase>,
}

/// What the previous run for this identity left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorRun {
    pub state_path: PathBuf,
    pub last_editor: Option<String>,
    pub results: Option<RunResults>,
}

#[derive(Debug)]
struct PhaseTrail {
    phases: Vec<RunPhase>,
}

impl PhaseTrail {
    fn new() -> Self {
        Self {
            phases: vec![RunPhase::Init],
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        let from = self.phases.last().copied().unwrap_or(RunPhase::Init);
        tracing::debug!(?from, to = ?phase, "Run phase transition");
        self.phases.push(phase);
    }
}

pub struct RunOrchestrator {
    layout: ProjectLayout,
    identity: WarehouseIdentity,
    dbt: DbtCli,
    store: Arc<dyn VersionedFileStore>,
}

impl RunOrchestrator {
    pub fn new(layout: ProjectLayout, identity: WarehouseIdentity, dbt: DbtCli, store: Arc<dyn VersionedFileStore>) -> Self {
        Self {
            layout,
            identity,
            dbt,
            store,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        state_path(&self.layout.state_root(), &self.identity)
    }

    /// Drive one full run. Templates under the macros directory are reverted
    /// before this returns, on every path. Without any tracked macros there
    /// is nothing to revert and the revert step is skipped.
    pub async fn execute(&self, selection: Option<&str>, prompt: &mut dyn Confirmation) -> Result<RunReport, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_run_span("run", &self.identity, selection, &correlation_id);

        async move {
            let mut trail = PhaseTrail::new();
            let mut interrupts = None;
            let macros_dir = self.layout.macros_dir();

            let outcome = if self.store.is_tracked(&macros_dir).await? {
                let scope = MacroScope::new(self.store.as_ref(), macros_dir);
                let outcome = scope
                    .run(self.lifecycle(selection, prompt, &mut trail, &mut interrupts))
                    .await?;
                trail.enter(RunPhase::Reverted);
                outcome
            } else {
                tracing::info!(macros_dir = %macros_dir.display(), "No tracked macros; nothing will be reverted");
                self.lifecycle(selection, prompt, &mut trail, &mut interrupts).await?
            };
            drop(interrupts);

            match &outcome {
                RunOutcome::Completed { state_path, .. } => {
                    tracing::info!(state_path = %state_path.display(), "Run complete; new state staged for commit")
                }
                RunOutcome::Declined => tracing::info!("Run declined; state untouched"),
            }
            Ok(RunReport {
                outcome,
                phases: trail.phases,
            })
        }
        .instrument(span)
        .await
    }

    async fn lifecycle(
        &self,
        selection: Option<&str>,
        prompt: &mut dyn Confirmation,
        trail: &mut PhaseTrail,
        interrupts: &mut Option<InterruptGuard>,
    ) -> Result<RunOutcome, WorkflowError> {
        self.ensure_templates_restorable().await?;
        interpolate_macros(&self.layout.macros_dir(), self.layout.root()).await?;
        trail.enter(RunPhase::Interpolated);

        let prior = self.resolve_prior_run().await?;
        match &prior {
            Some(prior) => report_prior_run(prior),
            None => tracing::info!("No previous state found. Running dbt from scratch"),
        }
        trail.enter(RunPhase::StatePathResolved);

        trail.enter(RunPhase::ConfirmationPending);
        if !prompt.confirm("Continue?")? {
            trail.enter(RunPhase::Aborted);
            return Ok(RunOutcome::Declined);
        }

        trail.enter(RunPhase::Running);
        let prior_state = prior.as_ref().map(|p| p.state_path.as_path());
        // Held until the templates are reverted, not just until dbt exits.
        interrupts.get_or_insert_with(InterruptGuard::install);
        self.dbt.run(selection, prior_state).await?;

        let state_path = self.state_path();
        archive_state(&self.layout.target_dir(), &state_path).await?;
        trail.enter(RunPhase::Archived);

        self.store.stage(&state_path).await?;
        trail.enter(RunPhase::Staged);

        Ok(RunOutcome::Completed {
            state_path,
            used_prior_state: prior_state.is_some(),
        })
    }

    /// Every template that interpolation would rewrite must be restorable
    /// from the store.
    async fn ensure_templates_restorable(&self) -> Result<(), WorkflowError> {
        for template in templates_with_directives(&self.layout.macros_dir()).await? {
            if !self.store.is_tracked(&template).await? {
                return Err(WorkflowError::UntrackedTemplate { path: template });
            }
        }
        Ok(())
    }

    /// `None` when no state directory exists yet for this identity.
    pub async fn resolve_prior_run(&self) -> Result<Option<PriorRun>, WorkflowError> {
        let state_path = self.state_path();
        if !path_exists(&state_path).await? {
            return Ok(None);
        }

        let manifest = state_path.join(MANIFEST_FILE);
        let last_editor = if path_exists(&manifest).await? {
            self.store.last_author(&manifest).await?
        } else {
            None
        };

        let run_results = state_path.join(RUN_RESULTS_FILE);
        let results = if path_exists(&run_results).await? {
            Some(RunResults::load(&run_results).await?)
        } else {
            None
        };

        Ok(Some(PriorRun {
            state_path,
            last_editor,
            results,
        }))
    }
}

async fn path_exists(path: &Path) -> Result<bool, WorkflowError> {
    tokio::fs::try_exists(path).await.map_err(WorkflowError::io(path))
}

fn report_prior_run(prior: &PriorRun) {
    tracing::info!(state_path = %prior.state_path.display(), "Found previous state");
    if let Some(editor) = &prior.last_editor {
        println!("Last user to run dbt on this database: {editor}");
    }
    if let Some(results) = &prior.results {
        println!("Info about the last time this project was run:");
        print!("{}", results.render_summary());
    }
}
