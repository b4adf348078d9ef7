//! Document store with pluggable storage mappers and a readiness-driven
//! transfer pipeline.

// Core subsystems
pub mod domain;
pub mod mapper;
pub mod service;
pub mod transfer;

// Boundary
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use domain::Document;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use mapper::{DocumentDataMapper, InMemoryDocumentDataMapper, PhysicalDocumentDataMapper};
pub use service::DocumentService;
