//! Mapper error type.

use thiserror::Error;

use crate::domain::DomainError;

pub type MapperResult<T> = Result<T, MapperError>;

/// Failure raised by a [`DocumentDataMapper`](super::DocumentDataMapper).
#[derive(Debug, Error)]
pub enum MapperError {
    /// A required argument was not supplied.
    #[error("{0} may not be null")]
    NullArgument(&'static str),

    #[error("Document identified by documentId: {0} does not exist in store")]
    NotInStore(String),

    /// The id or location could not form a valid document.
    #[error(transparent)]
    InvalidDocument(#[from] DomainError),

    /// The backend failed while touching the stored bytes.
    #[error("I/O failure for document {id}: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

impl MapperError {
    pub fn io(id: impl Into<String>, source: std::io::Error) -> Self {
        MapperError::Io {
            id: id.into(),
            source,
        }
    }
}
