//! Mapper whose writes and reads break partway, for exercising fault paths.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, ReadBuf};

use crate::domain::{Document, DomainError};
use crate::mapper::{DocumentContent, DocumentDataMapper, MapperError, MapperResult, StagedWrite};

#[derive(Debug, Default)]
pub(crate) struct FaultyMapper {
    /// Chunk index (0-based) on which staged writes fail.
    fail_write_at: usize,
    /// Bytes readable before retrieved content errors.
    readable: Vec<u8>,
    discarded: Arc<AtomicBool>,
    committed: Arc<AtomicBool>,
}

impl FaultyMapper {
    pub(crate) fn failing_write_at(chunk: usize) -> Self {
        Self {
            fail_write_at: chunk,
            ..Self::default()
        }
    }

    pub(crate) fn failing_read_after(readable: &[u8]) -> Self {
        Self {
            fail_write_at: usize::MAX,
            readable: readable.to_vec(),
            ..Self::default()
        }
    }

    /// Set once a staged write is dropped without commit.
    pub(crate) fn discarded(&self) -> Arc<AtomicBool> {
        self.discarded.clone()
    }

    pub(crate) fn committed(&self) -> Arc<AtomicBool> {
        self.committed.clone()
    }

    fn staged(&self, document_id: &str) -> Box<dyn StagedWrite> {
        Box::new(FailingWrite {
            document_id: document_id.to_string(),
            seen: 0,
            fail_at: self.fail_write_at,
            discarded: self.discarded.clone(),
            committed: self.committed.clone(),
            done: false,
        })
    }
}

#[async_trait]
impl DocumentDataMapper for FaultyMapper {
    fn backend(&self) -> &'static str {
        "faulty"
    }

    fn document_for(&self, document_id: &str) -> Result<Document, DomainError> {
        Document::in_memory(document_id)
    }

    async fn begin_create(&self, document: &Document) -> MapperResult<Box<dyn StagedWrite>> {
        Ok(self.staged(document.id()))
    }

    async fn begin_update(&self, document_id: &str) -> MapperResult<Box<dyn StagedWrite>> {
        Ok(self.staged(document_id))
    }

    async fn retrieve_document_by_id(&self, _document_id: &str) -> MapperResult<Option<DocumentContent>> {
        let len = self.readable.len() as u64 + 1;
        let reader = BrokenReader {
            readable: self.readable.clone(),
            pos: 0,
        };
        Ok(Some(DocumentContent::new(reader, Some(len))))
    }

    async fn delete_document(&self, _document_id: &str) -> MapperResult<()> {
        Ok(())
    }
}

struct FailingWrite {
    document_id: String,
    seen: usize,
    fail_at: usize,
    discarded: Arc<AtomicBool>,
    committed: Arc<AtomicBool>,
    done: bool,
}

#[async_trait]
impl StagedWrite for FailingWrite {
    async fn write_chunk(&mut self, _chunk: &[u8]) -> MapperResult<()> {
        let index = self.seen;
        self.seen += 1;
        if index == self.fail_at {
            return Err(MapperError::io(&self.document_id, io::Error::other("device full")));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> MapperResult<u64> {
        let mut this = self;
        this.done = true;
        this.committed.store(true, Ordering::SeqCst);
        Ok(0)
    }
}

impl Drop for FailingWrite {
    fn drop(&mut self) {
        if !self.done {
            self.discarded.store(true, Ordering::SeqCst);
        }
    }
}

/// Yields `readable`, then fails every further read.
struct BrokenReader {
    readable: Vec<u8>,
    pos: usize,
}

impl AsyncRead for BrokenReader {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = self.readable.len() - self.pos;
        if remaining == 0 {
            return Poll::Ready(Err(io::Error::other("disk gone")));
        }
        let n = remaining.min(buf.remaining());
        let start = self.pos;
        buf.put_slice(&self.readable[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}
