//! Readiness-driven document transfer pipeline.
//!
//! # Data Flow
//! ```text
//! inbound (create / update):
//!     transport Stream ──chunk when ready──▶ ReadListener ──▶ DocumentUpload
//!                      ──end of input────▶ commit ──▶ Completion
//!
//! outbound (retrieve):
//!     DocumentService::retrieve ──▶ WriteListener (resolved once)
//!     transport Sink ──poll_ready──▶ read one chunk ──▶ start_send
//!                    ──source exhausted──▶ close ──▶ Completion
//! ```
//!
//! # Design Decisions
//! - A listener touches the transport only after it reported readiness:
//!   inbound chunks are taken only when the stream yields them, outbound
//!   chunks are read only after `poll_ready` succeeded
//! - Each step moves at most one chunk; `Pending` suspends the transfer
//! - The completion is consumed on the first terminal transition; a
//!   listener dropped early reports `Aborted` from `Drop`
//! - Faults are terminal; retry is a new transfer

pub mod completion;
pub mod read;
pub mod state;
pub mod write;

use std::time::Instant;

use crate::observability::metrics;

pub use completion::{completion, Completion, CompletionHandle};
pub use read::{drive_inbound, ReadListener};
pub use state::{BoxError, Direction, TransferFault, TransferOutcome, TransferState};
pub use write::{drive_outbound, WriteListener, DEFAULT_CHUNK_SIZE};

/// Bookkeeping shared by both listeners: state, byte count and the
/// completion that reports the terminal outcome.
#[derive(Debug)]
struct Transfer {
    direction: Direction,
    document_id: String,
    request_id: Option<String>,
    state: TransferState,
    bytes: u64,
    started: Instant,
    completion: Option<Completion>,
}

impl Transfer {
    fn new(direction: Direction, document_id: &str, completion: Completion) -> Self {
        Self {
            direction,
            document_id: document_id.to_string(),
            request_id: None,
            state: TransferState::Idle,
            bytes: 0,
            started: Instant::now(),
            completion: Some(completion),
        }
    }

    fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("-")
    }

    fn begin_draining(&mut self) {
        if self.state == TransferState::Idle {
            self.state = TransferState::Draining;
            tracing::debug!(
                request_id = %self.request_id(),
                document_id = %self.document_id,
                direction = self.direction.as_str(),
                "Transfer draining"
            );
        }
    }

    fn add_bytes(&mut self, n: usize) {
        self.bytes += n as u64;
    }

    fn complete(&mut self) {
        let outcome = TransferOutcome::Completed {
            document_id: self.document_id.clone(),
            bytes: self.bytes,
        };
        self.finish(TransferState::Completed, outcome);
    }

    fn not_found(&mut self) {
        let outcome = TransferOutcome::NotFound {
            document_id: self.document_id.clone(),
        };
        self.finish(TransferState::Failed, outcome);
    }

    fn fail(&mut self, fault: TransferFault) {
        let outcome = TransferOutcome::Failed {
            document_id: self.document_id.clone(),
            fault,
        };
        self.finish(TransferState::Failed, outcome);
    }

    fn finish(&mut self, state: TransferState, outcome: TransferOutcome) {
        let Some(completion) = self.completion.take() else {
            tracing::error!(
                request_id = %self.request_id(),
                document_id = %self.document_id,
                outcome = outcome.label(),
                "Transfer already reported; dropping second outcome"
            );
            return;
        };
        self.state = state;

        match &outcome {
            TransferOutcome::Failed { fault, .. } => tracing::warn!(
                request_id = %self.request_id(),
                document_id = %self.document_id,
                direction = self.direction.as_str(),
                bytes = self.bytes,
                error = %fault,
                "Transfer failed"
            ),
            _ => tracing::info!(
                request_id = %self.request_id(),
                document_id = %self.document_id,
                direction = self.direction.as_str(),
                bytes = self.bytes,
                outcome = outcome.label(),
                "Transfer finished"
            ),
        }
        metrics::record_transfer(self.direction.as_str(), outcome.label(), self.bytes, self.started);

        completion.complete(outcome);
    }
}

impl Drop for Transfer {
    fn drop(&mut self) {
        if self.completion.is_some() {
            self.fail(TransferFault::Aborted);
        }
    }
}
