//! Service-level error type.

use thiserror::Error;

use crate::mapper::MapperError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Classification of a service failure, used by the boundary layer to pick
/// an externally visible outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed identifier or location.
    Validation,
    /// A required argument was missing.
    InvalidArgument,
    /// The referenced document does not exist.
    NotFound,
    /// The backend failed while reading or writing bytes.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Io => "io",
        }
    }
}

/// Uniform wrapper over every mapper failure.
///
/// The message is the mapper's own; the mapper error is kept as the source
/// so the underlying cause chain stays intact.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ServiceError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: MapperError,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn mapper_error(&self) -> &MapperError {
        &self.source
    }
}

impl From<MapperError> for ServiceError {
    fn from(source: MapperError) -> Self {
        let kind = match &source {
            MapperError::NullArgument(_) => ErrorKind::InvalidArgument,
            MapperError::NotInStore(_) => ErrorKind::NotFound,
            MapperError::InvalidDocument(_) => ErrorKind::Validation,
            MapperError::Io { .. } => ErrorKind::Io,
        };
        Self {
            kind,
            message: source.to_string(),
            source,
        }
    }
}
