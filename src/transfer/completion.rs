//! Exactly-once completion signal.

use tokio::sync::oneshot;

use crate::transfer::state::TransferOutcome;

/// Sending half, owned by a listener. `complete` consumes it, so a transfer
/// cannot report twice.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<TransferOutcome>,
}

/// Receiving half, held by the boundary layer.
#[derive(Debug)]
pub struct CompletionHandle {
    rx: oneshot::Receiver<TransferOutcome>,
}

/// Create a linked completion pair.
pub fn completion() -> (Completion, CompletionHandle) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, CompletionHandle { rx })
}

impl Completion {
    pub fn complete(self, outcome: TransferOutcome) {
        if let Err(outcome) = self.tx.send(outcome) {
            tracing::debug!(
                document_id = %outcome.document_id(),
                outcome = outcome.label(),
                "Completion receiver dropped before outcome was delivered"
            );
        }
    }
}

impl CompletionHandle {
    /// Wait for the terminal outcome.
    ///
    /// Returns `None` only if the sending side vanished without reporting,
    /// which listeners never do.
    pub async fn outcome(self) -> Option<TransferOutcome> {
        self.rx.await.ok()
    }

    /// Take the outcome if it has already been delivered.
    pub fn try_outcome(&mut self) -> Option<TransferOutcome> {
        self.rx.try_recv().ok()
    }
}
