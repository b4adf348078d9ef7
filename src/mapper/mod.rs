//! Storage mapper subsystem.
//!
//! # Data Flow
//! ```text
//! create/update:
//!     begin_create / begin_update → StagedWrite
//!     → write_chunk (repeated, in arrival order)
//!     → commit (content becomes visible in one step)
//!
//! retrieve:
//!     retrieve_document_by_id → Option<DocumentContent> (AsyncRead)
//! ```
//!
//! # Design Decisions
//! - Writes are staged; dropping an uncommitted write discards it
//! - Readers see either the previous or the new full content, never a mix
//! - Absence on retrieve is `None`, not an error; delete is idempotent
//! - No cross-id locking; concurrent writers of one id are last-writer-wins

pub mod error;
#[cfg(test)]
pub(crate) mod fault;
pub mod memory;
pub mod physical;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::domain::{Document, DomainError};

pub use error::{MapperError, MapperResult};
pub use memory::InMemoryDocumentDataMapper;
pub use physical::PhysicalDocumentDataMapper;

/// Buffer size used when draining a whole content stream into a mapper.
pub const DRAIN_CHUNK_SIZE: usize = 8 * 1024;

/// An uncommitted write into the store.
#[async_trait]
pub trait StagedWrite: Send {
    /// Append bytes to the staged content.
    async fn write_chunk(&mut self, chunk: &[u8]) -> MapperResult<()>;

    /// Publish the staged content, returning the number of bytes stored.
    async fn commit(self: Box<Self>) -> MapperResult<u64>;
}

/// Readable handle on stored content.
pub struct DocumentContent {
    reader: Pin<Box<dyn AsyncRead + Send>>,
    len: Option<u64>,
}

impl DocumentContent {
    pub fn new<R>(reader: R, len: Option<u64>) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            reader: Box::pin(reader),
            len,
        }
    }

    /// Content length, when the backend knows it up front.
    pub fn len(&self) -> Option<u64> {
        self.len
    }

    /// Read the remaining content into memory.
    pub async fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.len.unwrap_or(0) as usize);
        self.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl AsyncRead for DocumentContent {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.reader.as_mut().poll_read(cx, buf)
    }
}

impl fmt::Debug for DocumentContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentContent").field("len", &self.len).finish()
    }
}

/// Storage backend keyed by document id.
#[async_trait]
pub trait DocumentDataMapper: Send + Sync + fmt::Debug {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Build the document variant this backend stores for `document_id`.
    fn document_for(&self, document_id: &str) -> Result<Document, DomainError>;

    /// Open a staged write that will create (or overwrite) `document`.
    async fn begin_create(&self, document: &Document) -> MapperResult<Box<dyn StagedWrite>>;

    /// Open a staged write replacing an existing document.
    ///
    /// Fails with [`MapperError::NotInStore`] when nothing is stored under the id.
    async fn begin_update(&self, document_id: &str) -> MapperResult<Box<dyn StagedWrite>>;

    async fn retrieve_document_by_id(&self, document_id: &str) -> MapperResult<Option<DocumentContent>>;

    /// Remove a document. Removing an absent id succeeds.
    async fn delete_document(&self, document_id: &str) -> MapperResult<()>;
}

impl dyn DocumentDataMapper + '_ {
    /// Drain `content` into a new entry for `document`.
    pub async fn create_document<R>(&self, document: Option<&Document>, content: Option<R>) -> MapperResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let document = document.ok_or(MapperError::NullArgument("document"))?;
        let content = content.ok_or(MapperError::NullArgument("documentInputStream"))?;

        let staged = self.begin_create(document).await?;
        drain_into(document.id(), content, staged).await
    }

    /// Drain `content` over the existing entry for `document_id`.
    pub async fn update_document<R>(&self, document_id: Option<&str>, content: Option<R>) -> MapperResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let document_id = document_id.ok_or(MapperError::NullArgument("documentId"))?;
        let content = content.ok_or(MapperError::NullArgument("documentInputStream"))?;

        let staged = self.begin_update(document_id).await?;
        drain_into(document_id, content, staged).await
    }
}

async fn drain_into<R>(document_id: &str, mut content: R, mut staged: Box<dyn StagedWrite>) -> MapperResult<u64>
where
    R: AsyncRead + Unpin + Send,
{
    let mut buf = vec![0u8; DRAIN_CHUNK_SIZE];
    loop {
        let n = content
            .read(&mut buf)
            .await
            .map_err(|e| MapperError::io(document_id, e))?;
        if n == 0 {
            break;
        }
        staged.write_chunk(&buf[..n]).await?;
    }
    staged.commit().await
}
