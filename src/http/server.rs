//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the document and health handlers
//! - Wire up middleware (tracing, limits, timeouts, request ID, metrics)
//! - Bind server to listener
//! - Stop accepting on shutdown and let in-flight requests finish

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ServerConfig, TransferConfig};
use crate::http::handlers;
use crate::http::request::record_metrics;
use crate::lifecycle::{shutdown, signals::shutdown_signal};
use crate::service::DocumentService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: DocumentService,
    pub transfer: TransferConfig,
}

/// HTTP server for the document store.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, service: DocumentService) -> Self {
        let state = AppState {
            service,
            transfer: config.transfer.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/storage/documents", document_routes())
            .route("/storage/documents/", document_routes())
            .route("/storage/documents/{*path}", document_routes())
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.transfer.max_document_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(middleware::from_fn(record_metrics))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown_rx` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = self.config.storage.backend.as_str(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown::wait(shutdown_rx) => {}
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

fn document_routes() -> MethodRouter<AppState> {
    get(handlers::retrieve_document)
        .post(handlers::create_document)
        .put(handlers::update_document)
        .delete(handlers::delete_document)
}
