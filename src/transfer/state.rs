//! Transfer states, outcomes and faults.
//!
//! # State Transitions
//! ```text
//! Idle → Draining: first readiness signal (inbound) / document resolved (outbound)
//! Draining → Completed: end of input committed / source exhausted
//! Idle | Draining → Failed: not found, transport fault, storage fault, abort
//! ```
//! Completed and Failed are terminal.

use thiserror::Error;

use crate::service::ServiceError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Registered, waiting for the first readiness signal.
    Idle,
    /// Moving bytes.
    Draining,
    Completed,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Completed | TransferState::Failed)
    }
}

/// Which way bytes flow relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Transport → store (create, update).
    Inbound,
    /// Store → transport (retrieve).
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Mid-stream failure of a transfer. Always terminal, never retried.
#[derive(Debug, Error)]
pub enum TransferFault {
    /// The external byte stream failed.
    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),

    /// The store failed while accepting or producing bytes.
    #[error("storage failure: {0}")]
    Storage(#[from] ServiceError),

    /// The transfer was dropped before it reached a terminal state.
    #[error("transfer aborted before completion")]
    Aborted,
}

impl TransferFault {
    pub fn transport(error: impl Into<BoxError>) -> Self {
        TransferFault::Transport(error.into())
    }
}

/// Terminal result of a transfer, delivered once through its completion.
#[derive(Debug)]
pub enum TransferOutcome {
    Completed { document_id: String, bytes: u64 },
    NotFound { document_id: String },
    Failed { document_id: String, fault: TransferFault },
}

impl TransferOutcome {
    pub fn document_id(&self) -> &str {
        match self {
            TransferOutcome::Completed { document_id, .. }
            | TransferOutcome::NotFound { document_id }
            | TransferOutcome::Failed { document_id, .. } => document_id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransferOutcome::Completed { .. } => "completed",
            TransferOutcome::NotFound { .. } => "not_found",
            TransferOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TransferOutcome::Completed { .. })
    }
}
