//! Request identification and document id extraction.
//!
//! # Responsibilities
//! - Carry a request ID on every request (generated UUID v4 when absent)
//! - Resolve the document id from the request target
//! - Record per-request metrics
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Malformed targets are rejected here, before any transfer starts

use std::convert::Infallible;
use std::time::Instant;

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use uuid::Uuid;

use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Header naming the document on upload.
pub const X_DOCUMENT_ID: &str = "x-documentid";

/// The request's correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(|| Self(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed document request")]
pub struct MalformedRequest;

/// Take the document id from the last segment of a request path.
///
/// Empty paths and paths ending in `/` are rejected; the segment itself is
/// validated later, by the domain.
pub fn extract_document_id(path: &str) -> Result<&str, MalformedRequest> {
    if path.is_empty() || path.ends_with('/') {
        return Err(MalformedRequest);
    }
    let start = path.rfind('/').map_or(0, |i| i + 1);
    Ok(&path[start..])
}

/// Middleware recording request count and latency.
pub async fn record_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
