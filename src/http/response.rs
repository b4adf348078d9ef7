//! Mapping of service failures and transfer outcomes to HTTP responses.
//!
//! # Status Mapping
//! - Validation / missing argument → 400
//! - Not found → 404
//! - Storage I/O → 500
//! - Transport fault during upload → 400
//! - Aborted transfer → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::{ErrorKind, ServiceError};
use crate::transfer::{TransferFault, TransferOutcome};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: &ServiceError) -> Response {
    (status_for(err.kind()), err.message().to_string()).into_response()
}

/// Status for a terminal transfer outcome; `success` is used for
/// `Completed`.
pub fn outcome_status(outcome: &TransferOutcome, success: StatusCode) -> StatusCode {
    match outcome {
        TransferOutcome::Completed { .. } => success,
        TransferOutcome::NotFound { .. } => StatusCode::NOT_FOUND,
        TransferOutcome::Failed { fault, .. } => match fault {
            TransferFault::Transport(_) => StatusCode::BAD_REQUEST,
            TransferFault::Storage(e) => status_for(e.kind()),
            TransferFault::Aborted => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

pub fn outcome_response(outcome: Option<TransferOutcome>, success: StatusCode) -> Response {
    let Some(outcome) = outcome else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let status = outcome_status(&outcome, success);
    match outcome {
        TransferOutcome::Completed { .. } => status.into_response(),
        TransferOutcome::NotFound { document_id } => {
            (status, format!("Document {} not found", document_id)).into_response()
        }
        TransferOutcome::Failed { fault, .. } => (status, fault.to_string()).into_response(),
    }
}
