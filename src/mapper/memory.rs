//! Heap-resident mapper backend.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;

use crate::domain::{Document, DomainError};
use crate::mapper::{DocumentContent, DocumentDataMapper, MapperError, MapperResult, StagedWrite};

/// Stores document bytes in a concurrent map for the lifetime of the process.
///
/// Entries are immutable `Bytes`; a commit swaps the whole value in one
/// insert, so a reader holding the previous value keeps seeing it intact.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentDataMapper {
    store: Arc<DashMap<String, Bytes>>,
}

impl InMemoryDocumentDataMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl DocumentDataMapper for InMemoryDocumentDataMapper {
    fn backend(&self) -> &'static str {
        "in_memory"
    }

    fn document_for(&self, document_id: &str) -> Result<Document, DomainError> {
        Document::in_memory(document_id)
    }

    async fn begin_create(&self, document: &Document) -> MapperResult<Box<dyn StagedWrite>> {
        Ok(Box::new(MemoryStagedWrite {
            store: Arc::clone(&self.store),
            document_id: document.id().to_string(),
            buffer: BytesMut::new(),
            replace_only: false,
        }))
    }

    async fn begin_update(&self, document_id: &str) -> MapperResult<Box<dyn StagedWrite>> {
        if !self.store.contains_key(document_id) {
            return Err(MapperError::NotInStore(document_id.to_string()));
        }
        Ok(Box::new(MemoryStagedWrite {
            store: Arc::clone(&self.store),
            document_id: document_id.to_string(),
            buffer: BytesMut::new(),
            replace_only: true,
        }))
    }

    async fn retrieve_document_by_id(&self, document_id: &str) -> MapperResult<Option<DocumentContent>> {
        Ok(self.store.get(document_id).map(|entry| {
            let bytes = entry.value().clone();
            let len = bytes.len() as u64;
            DocumentContent::new(Cursor::new(bytes), Some(len))
        }))
    }

    async fn delete_document(&self, document_id: &str) -> MapperResult<()> {
        if self.store.remove(document_id).is_some() {
            tracing::debug!(document_id = %document_id, "Removed in-memory document");
        }
        Ok(())
    }
}

struct MemoryStagedWrite {
    store: Arc<DashMap<String, Bytes>>,
    document_id: String,
    buffer: BytesMut,
    replace_only: bool,
}

#[async_trait]
impl StagedWrite for MemoryStagedWrite {
    async fn write_chunk(&mut self, chunk: &[u8]) -> MapperResult<()> {
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> MapperResult<u64> {
        let MemoryStagedWrite {
            store,
            document_id,
            buffer,
            replace_only,
        } = *self;
        let len = buffer.len() as u64;

        if replace_only {
            // Deleted while the update was in flight.
            let Some(mut entry) = store.get_mut(&document_id) else {
                return Err(MapperError::NotInStore(document_id));
            };
            *entry = buffer.freeze();
        } else {
            store.insert(document_id, buffer.freeze());
        }
        Ok(len)
    }
}
