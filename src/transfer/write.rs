//! Outbound transfer: stored content into a transport sink.

use std::future::poll_fn;
use std::io;

use bytes::Bytes;
use futures_util::{Sink, SinkExt};
use tokio::io::AsyncReadExt;

use crate::mapper::{DocumentContent, MapperError};
use crate::service::{DocumentService, ServiceError};
use crate::transfer::completion::Completion;
use crate::transfer::state::{BoxError, Direction, TransferFault, TransferState};
use crate::transfer::Transfer;

/// Upper bound on bytes moved per write step.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Listener for a download.
#[derive(Debug)]
pub struct WriteListener {
    source: Option<DocumentContent>,
    content_length: Option<u64>,
    buf: Box<[u8]>,
    transfer: Transfer,
}

impl WriteListener {
    pub fn new(document_id: &str, chunk_size: usize, completion: Completion) -> Self {
        Self {
            source: None,
            content_length: None,
            buf: vec![0u8; chunk_size.max(1)].into_boxed_slice(),
            transfer: Transfer::new(Direction::Outbound, document_id, completion),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.transfer.request_id = Some(request_id.into());
        self
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state
    }

    pub fn document_id(&self) -> &str {
        &self.transfer.document_id
    }

    /// Length of the resolved content, if the backend reported one.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Bytes handed to the sink so far.
    pub fn bytes(&self) -> u64 {
        self.transfer.bytes
    }

    /// Look the document up. Happens once; absence ends the transfer as
    /// not found without writing anything.
    pub async fn resolve(&mut self, service: &DocumentService) -> TransferState {
        if self.transfer.state != TransferState::Idle {
            return self.transfer.state;
        }
        match service.retrieve_document(&self.transfer.document_id).await {
            Ok(Some(content)) => {
                self.content_length = content.len();
                self.source = Some(content);
                self.transfer.begin_draining();
            }
            Ok(None) => self.transfer.not_found(),
            Err(e) => self.fail(TransferFault::Storage(e)),
        }
        self.transfer.state
    }

    /// The sink reported it can take one more item.
    ///
    /// Reads at most one chunk from the source and sends it; when the source
    /// is exhausted the sink is closed and the transfer completes. Callers
    /// must have observed `poll_ready` succeed on `sink` first.
    pub async fn on_write_possible<Si>(&mut self, sink: &mut Si)
    where
        Si: Sink<io::Result<Bytes>> + Unpin,
        Si::Error: Into<BoxError>,
    {
        if self.transfer.state != TransferState::Draining {
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };

        match source.read(&mut self.buf).await {
            Ok(0) => {
                self.source = None;
                match poll_fn(|cx| sink.poll_close_unpin(cx)).await {
                    Ok(()) => self.transfer.complete(),
                    Err(e) => self.fail(TransferFault::transport(e)),
                }
            }
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&self.buf[..n]);
                match sink.start_send_unpin(Ok(chunk)) {
                    Ok(()) => self.transfer.add_bytes(n),
                    Err(e) => self.fail(TransferFault::transport(e)),
                }
            }
            Err(e) => {
                // Pass the failure downstream so the consumer does not take a
                // truncated body for a complete one.
                if let Err(send_err) = sink.start_send_unpin(Err(io::Error::new(e.kind(), e.to_string()))) {
                    let send_err: BoxError = send_err.into();
                    tracing::debug!(
                        document_id = %self.transfer.document_id,
                        error = %send_err,
                        "Consumer gone before source fault was delivered"
                    );
                }
                let error = MapperError::io(self.transfer.document_id.clone(), e);
                self.fail(TransferFault::Storage(ServiceError::from(error)));
            }
        }
    }

    /// The sink failed; the source is released.
    pub fn on_error(&mut self, error: impl Into<BoxError>) {
        if self.transfer.state.is_terminal() {
            return;
        }
        self.fail(TransferFault::transport(error));
    }

    fn fail(&mut self, fault: TransferFault) {
        self.source = None;
        self.transfer.fail(fault);
    }
}

/// Run a resolved outbound transfer to its terminal state.
///
/// Every step first waits for the sink to report readiness; while it is not
/// ready the transfer is suspended and the source is not read.
pub async fn drive_outbound<Si>(mut listener: WriteListener, mut sink: Si) -> TransferState
where
    Si: Sink<io::Result<Bytes>> + Unpin,
    Si::Error: Into<BoxError>,
{
    if listener.state() == TransferState::Idle {
        tracing::warn!(document_id = %listener.document_id(), "Outbound transfer driven before resolve");
    }
    while listener.state() == TransferState::Draining {
        match poll_fn(|cx| sink.poll_ready_unpin(cx)).await {
            Ok(()) => listener.on_write_possible(&mut sink).await,
            Err(e) => listener.on_error(e),
        }
    }
    listener.state()
}
