//! Domain validation errors.

use thiserror::Error;

/// Raised when a document cannot be constructed.
///
/// Variants carry no source: validation failures are never caused by
/// another error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("id may not be empty or null")]
    EmptyId,

    #[error("Document id must be alpha-numeric with a '.' extension and no more than 20 characters")]
    MalformedId,

    #[error("physicalLocation may not be empty or null")]
    EmptyLocation,
}
