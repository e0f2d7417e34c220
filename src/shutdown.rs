use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Keeps this process alive on Ctrl-C from the start of the dbt run until the
/// interpolated macros have been reverted.
///
/// dbt sits in the same foreground process group and receives the interrupt
/// itself; once it exits the workflow sees a failed step and still reverts.
/// Interrupts arriving while state is archived, staged or reverted are logged
/// and otherwise ignored. A SIGKILL remains unhandled.
///
/// Once installed, tokio keeps the SIGINT handler registered for the rest of
/// the process even after the guard is dropped.
pub struct InterruptGuard {
    listener: Option<JoinHandle<()>>,
    received: Arc<AtomicUsize>,
}

impl InterruptGuard {
    pub fn install() -> Self {
        info!("Installing interrupt handler until interpolated macros are reverted");
        let received = Arc::new(AtomicUsize::new(0));
        let listener = spawn_listener(received.clone());
        Self { listener, received }
    }

    /// Interrupts absorbed since installation.
    pub fn interrupts(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

fn record_interrupt(received: &AtomicUsize) {
    let count = received.fetch_add(1, Ordering::SeqCst) + 1;
    warn!(count, "Interrupt received; finishing the current step so interpolated macros can be reverted");
}

#[cfg(unix)]
fn spawn_listener(received: Arc<AtomicUsize>) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    // Registered here rather than in the task so no interrupt slips through
    // before the task is first polled.
    let mut interrupts = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to listen for interrupts: {}", e);
            return None;
        }
    };
    Some(tokio::spawn(async move {
        while interrupts.recv().await.is_some() {
            record_interrupt(&received);
        }
    }))
}

#[cfg(not(unix))]
fn spawn_listener(received: Arc<AtomicUsize>) -> Option<JoinHandle<()>> {
    Some(tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for interrupts: {}", e);
                return;
            }
            record_interrupt(&received);
        }
    }))
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if let Some(listener) = &self.listener {
            listener.abort();
        }
        let count = self.interrupts();
        if count > 0 {
            info!(count, "Interrupt handler removed after absorbing interrupts");
        }
    }
}
