//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configured storage backend
//! - Wrap it in the document service handed to the HTTP layer
//!
//! # Design Decisions
//! - Fail fast: a storage root that cannot be opened is fatal

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::mapper::{DocumentDataMapper, InMemoryDocumentDataMapper, MapperResult, PhysicalDocumentDataMapper};
use crate::service::DocumentService;

/// Build the document service for the configured backend.
pub async fn build_service(config: &StorageConfig) -> MapperResult<DocumentService> {
    let mapper: Arc<dyn DocumentDataMapper> = match config.backend {
        StorageBackend::InMemory => Arc::new(InMemoryDocumentDataMapper::new()),
        StorageBackend::Physical => Arc::new(PhysicalDocumentDataMapper::open(&config.root_dir).await?),
    };
    tracing::info!(backend = mapper.backend(), "Storage backend ready");
    Ok(DocumentService::new(mapper))
}
