use std::sync::Arc;

use tokio::sync::watch;

/// One-shot readiness signal for the tracked connection.
///
/// Starts unready; `mark_ready` flips it exactly once and every
/// clone observes the flip. There is no way back to unready, so a
/// task that saw `ready()` resolve can rely on the connection for
/// the rest of the run.
#[derive(Debug, Clone)]
pub struct ReadyGate {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadyGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Flip the gate to ready. Returns true only for the call that
    /// performed the transition; later calls are no-ops.
    pub fn mark_ready(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the gate is ready; immediately if it already is.
    pub async fn ready(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}
