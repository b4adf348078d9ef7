//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → request.rs (request ID, document id from target)
//!     → handlers.rs (open transfer, drive it with the body)
//!     → response.rs (outcome → status)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{extract_document_id, MalformedRequest, RequestId, X_DOCUMENT_ID, X_REQUEST_ID};
pub use server::HttpServer;
