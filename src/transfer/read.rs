//! Inbound transfer: transport bytes into a staged upload.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::service::DocumentUpload;
use crate::transfer::completion::Completion;
use crate::transfer::state::{BoxError, Direction, TransferFault, TransferState};
use crate::transfer::Transfer;

/// Listener for an upload.
///
/// Each callback corresponds to a readiness signal from the transport; the
/// listener never pulls bytes on its own.
#[derive(Debug)]
pub struct ReadListener {
    // Declared before `transfer` so the staged write is released before an
    // abort is reported.
    upload: Option<DocumentUpload>,
    transfer: Transfer,
}

impl ReadListener {
    pub fn new(upload: DocumentUpload, completion: Completion) -> Self {
        let transfer = Transfer::new(Direction::Inbound, upload.document_id(), completion);
        Self {
            upload: Some(upload),
            transfer,
        }
    }

    /// Tag log lines and outcomes with the boundary's request id.
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

    /// Bytes forwarded to the store so far.
    pub fn bytes(&self) -> u64 {
        self.transfer.bytes
    }

    /// The transport delivered `chunk`, which is everything it had ready.
    pub async fn on_data_available(&mut self, chunk: &[u8]) {
        if self.transfer.state.is_terminal() {
            return;
        }
        self.transfer.begin_draining();

        let Some(upload) = self.upload.as_mut() else {
            return;
        };
        if chunk.is_empty() {
            return;
        }
        match upload.write_chunk(chunk).await {
            Ok(()) => self.transfer.add_bytes(chunk.len()),
            Err(e) => self.fail(TransferFault::Storage(e)),
        }
    }

    /// The transport reached end of input: publish the upload.
    pub async fn on_all_data_read(&mut self) {
        if self.transfer.state.is_terminal() {
            return;
        }
        self.transfer.begin_draining();

        let Some(upload) = self.upload.take() else {
            return;
        };
        match upload.commit().await {
            Ok(bytes) => {
                self.transfer.bytes = bytes;
                self.transfer.complete();
            }
            Err(e) => self.fail(TransferFault::Storage(e)),
        }
    }

    /// The transport failed; the staged upload is discarded.
    pub fn on_error(&mut self, error: impl Into<BoxError>) {
        if self.transfer.state.is_terminal() {
            return;
        }
        self.fail(TransferFault::transport(error));
    }

    fn fail(&mut self, fault: TransferFault) {
        self.upload = None;
        self.transfer.fail(fault);
    }
}

/// Run an inbound transfer to its terminal state.
///
/// Chunks are consumed exactly as the stream yields them; while the stream is
/// pending the transfer is suspended without touching it.
pub async fn drive_inbound<S, E>(mut listener: ReadListener, mut stream: S) -> TransferState
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
{
    while !listener.state().is_terminal() {
        match stream.next().await {
            Some(Ok(chunk)) => listener.on_data_available(&chunk).await,
            Some(Err(e)) => listener.on_error(e),
            None => listener.on_all_data_read().await,
        }
    }
    listener.state()
}
