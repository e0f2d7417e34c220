use crate::error::WorkflowError;
use crate::external::VersionedFileStore;
use std::future::Future;
use std::path::PathBuf;

/// Scoped in-place mutation of tracked macro templates.
///
/// [`run`](Self::run) always reverts the templates through the versioned
/// file store once the enclosed work finishes, whether it succeeded, failed
/// or was declined. A scope dropped without reaching that point (panic,
/// cancelled future) logs where the operator has to clean up by hand.
pub struct MacroScope<'a> {
    store: &'a dyn VersionedFileStore,
    templates: PathBuf,
    released: bool,
}

impl<'a> MacroScope<'a> {
    pub fn new(store: &'a dyn VersionedFileStore, templates: impl Into<PathBuf>) -> Self {
        Self {
            store,
            templates: templates.into(),
            released: false,
        }
    }

    /// Await `work`, then revert. A revert failure after successful work is
    /// returned as the error; after failed work the original error wins and
    /// the revert failure is logged.
    pub async fn run<T, F>(mut self, work: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Result<T, WorkflowError>>,
    {
        let outcome = work.await;
        let reverted = self.store.revert(&self.templates).await;
        self.released = true;

        match (outcome, reverted) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(revert_error)) => {
                tracing::error!(
                    templates = %self.templates.display(),
                    error = %revert_error,
                    "Run completed but interpolated macros were not reverted; run `git checkout -- {}` before committing",
                    self.templates.display()
                );
                Err(revert_error.into())
            }
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(revert_error)) => {
                tracing::error!(
                    templates = %self.templates.display(),
                    error = %revert_error,
                    "Reverting interpolated macros also failed"
                );
                Err(error)
            }
        }
    }
}

impl Drop for MacroScope<'_> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                templates = %self.templates.display(),
                "Macro scope abandoned before revert; templates may still be interpolated"
            );
        }
    }
}
