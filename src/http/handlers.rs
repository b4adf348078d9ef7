//! Request handlers for the document endpoints.
//!
//! # Responsibilities
//! - Resolve the document id for each verb (header, multipart filename, path)
//! - Open a transfer and drive it with the request or response body
//! - Turn the terminal outcome into a status
//!
//! # Design Decisions
//! - Uploads are driven inline; the handler answers once the completion fires
//! - Downloads are driven in a spawned task that feeds the response body
//!   through a bounded channel, so a slow client suspends the transfer
//! - Nothing is written to the response before the document was resolved

use std::io;
use std::net::SocketAddr;
use std::pin::pin;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use futures::channel::mpsc;
use serde::Serialize;

use crate::http::request::{extract_document_id, RequestId, X_DOCUMENT_ID};
use crate::http::response::{error_response, outcome_response};
use crate::http::server::AppState;
use crate::mapper::MapperError;
use crate::service::ServiceError;
use crate::transfer::{completion, drive_inbound, drive_outbound, ReadListener, TransferOutcome, WriteListener};

/// Multipart part carrying the replacement content.
pub const DOCUMENT_PART: &str = "document";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "operational",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.service.backend(),
    })
}

/// `POST`: create a document named by the `x-documentid` header from the
/// raw request body.
pub async fn create_document(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request_id: RequestId,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let document_id = headers.get(X_DOCUMENT_ID).and_then(|v| v.to_str().ok());
    tracing::info!(
        request_id = %request_id,
        remote = %remote,
        document_id = ?document_id,
        "Create request"
    );

    let upload = match state.service.open_create(document_id).await {
        Ok(upload) => upload,
        Err(e) => return rejected(&request_id, &e),
    };

    let (completion, handle) = completion();
    let listener = ReadListener::new(upload, completion).with_request_id(request_id.as_str());
    drive_inbound(listener, pin!(body.into_data_stream())).await;

    outcome_response(handle.outcome().await, StatusCode::CREATED)
}

/// `PUT`: replace a document. The content comes from the `document` part of
/// a multipart body; the part's filename names the document.
pub async fn update_document(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request_id: RequestId,
    mut multipart: Multipart,
) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Unreadable multipart body");
                return (e.status(), e.body_text()).into_response();
            }
        };
        if field.name() != Some(DOCUMENT_PART) {
            continue;
        }

        let document_id = field.file_name().map(str::to_owned);
        tracing::info!(
            request_id = %request_id,
            remote = %remote,
            document_id = ?document_id,
            "Update request"
        );

        let upload = match state.service.open_update(document_id.as_deref()).await {
            Ok(upload) => upload,
            Err(e) => return rejected(&request_id, &e),
        };

        let (completion, handle) = completion();
        let listener = ReadListener::new(upload, completion).with_request_id(request_id.as_str());
        drive_inbound(listener, pin!(field)).await;

        return outcome_response(handle.outcome().await, StatusCode::NO_CONTENT);
    }

    let err = ServiceError::from(MapperError::NullArgument("documentInputStream"));
    rejected(&request_id, &err)
}

/// `GET`: stream a document back with its content length.
pub async fn retrieve_document(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request_id: RequestId,
    uri: Uri,
) -> Response {
    let document_id = match extract_document_id(uri.path()) {
        Ok(id) => id.to_string(),
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %uri.path(), "Malformed document request");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };
    tracing::info!(
        request_id = %request_id,
        remote = %remote,
        document_id = %document_id,
        "Retrieve request"
    );

    let (completion, mut handle) = completion();
    let mut listener = WriteListener::new(&document_id, state.transfer.chunk_size, completion)
        .with_request_id(request_id.as_str());
    if listener.resolve(&state.service).await.is_terminal() {
        drop(listener);
        return outcome_response(handle.try_outcome(), StatusCode::OK);
    }

    let content_length = listener.content_length();
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(state.transfer.response_buffer);
    tokio::spawn(async move {
        drive_outbound(listener, tx).await;
        if let Some(TransferOutcome::Failed { document_id, fault }) = handle.outcome().await {
            tracing::debug!(
                request_id = %request_id,
                document_id = %document_id,
                fault = %fault,
                "Response body ended early"
            );
        }
    });

    let mut response = Response::new(Body::from_stream(rx));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    if let Some(len) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    response
}

/// `DELETE`: remove a document; deleting an absent one still succeeds.
pub async fn delete_document(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request_id: RequestId,
    uri: Uri,
) -> Response {
    let document_id = match extract_document_id(uri.path()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %uri.path(), "Malformed document request");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };
    tracing::info!(
        request_id = %request_id,
        remote = %remote,
        document_id = %document_id,
        "Delete request"
    );

    match state.service.delete_document(document_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => rejected(&request_id, &e),
    }
}

fn rejected(request_id: &RequestId, err: &ServiceError) -> Response {
    tracing::warn!(
        request_id = %request_id,
        kind = err.kind().as_str(),
        error = %err,
        "Request rejected"
    );
    error_response(err)
}
