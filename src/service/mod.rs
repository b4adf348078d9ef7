//! Document service façade.
//!
//! # Responsibilities
//! - Hold the active mapper (injected at construction)
//! - Build domain documents for the mapper's backend
//! - Normalize every mapper failure into [`ServiceError`]
//!
//! The service adds no latency of its own beyond the mapper call it wraps.

pub mod error;

use std::fmt;
use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::mapper::{DocumentContent, DocumentDataMapper, MapperError, StagedWrite};

pub use error::{ErrorKind, ServiceError, ServiceResult};

#[derive(Clone)]
pub struct DocumentService {
    mapper: Arc<dyn DocumentDataMapper>,
}

impl DocumentService {
    pub fn new(mapper: Arc<dyn DocumentDataMapper>) -> Self {
        Self { mapper }
    }

    /// Name of the backend behind this service.
    pub fn backend(&self) -> &'static str {
        self.mapper.backend()
    }

    /// Store `content` under a new document.
    ///
    /// A missing id means there is no document to create.
    pub async fn create_document<R>(&self, document_id: Option<&str>, content: Option<R>) -> ServiceResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let document = document_id
            .map(|id| self.mapper.document_for(id))
            .transpose()
            .map_err(MapperError::from)?;
        Ok(self.mapper.create_document(document.as_ref(), content).await?)
    }

    /// Replace the content of an existing document.
    pub async fn update_document<R>(&self, document_id: Option<&str>, content: Option<R>) -> ServiceResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        Ok(self.mapper.update_document(document_id, content).await?)
    }

    /// Look up stored content; `Ok(None)` when nothing is stored under the id.
    pub async fn retrieve_document(&self, document_id: &str) -> ServiceResult<Option<DocumentContent>> {
        Ok(self.mapper.retrieve_document_by_id(document_id).await?)
    }

    pub async fn delete_document(&self, document_id: &str) -> ServiceResult<()> {
        Ok(self.mapper.delete_document(document_id).await?)
    }

    /// Open a staged upload that creates a document once committed.
    pub async fn open_create(&self, document_id: Option<&str>) -> ServiceResult<DocumentUpload> {
        let document_id = document_id.ok_or(MapperError::NullArgument("document"))?;
        let document = self.mapper.document_for(document_id).map_err(MapperError::from)?;
        let staged = self.mapper.begin_create(&document).await?;
        Ok(DocumentUpload::new(document.id(), staged))
    }

    /// Open a staged upload that replaces an existing document once committed.
    pub async fn open_update(&self, document_id: Option<&str>) -> ServiceResult<DocumentUpload> {
        let document_id = document_id.ok_or(MapperError::NullArgument("documentId"))?;
        let staged = self.mapper.begin_update(document_id).await?;
        Ok(DocumentUpload::new(document_id, staged))
    }
}

impl fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentService")
            .field("backend", &self.mapper.backend())
            .finish()
    }
}

/// A staged write seen through the service: same lifecycle as
/// [`StagedWrite`], failures reported as [`ServiceError`].
pub struct DocumentUpload {
    document_id: String,
    staged: Box<dyn StagedWrite>,
}

impl DocumentUpload {
    fn new(document_id: &str, staged: Box<dyn StagedWrite>) -> Self {
        Self {
            document_id: document_id.to_string(),
            staged,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> ServiceResult<()> {
        Ok(self.staged.write_chunk(chunk).await?)
    }

    pub async fn commit(self) -> ServiceResult<u64> {
        Ok(self.staged.commit().await?)
    }
}

impl fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("document_id", &self.document_id)
            .finish()
    }
}
