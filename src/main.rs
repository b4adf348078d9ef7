//! docuserv: document store server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http server ──▶ handlers ──▶ transfer listeners ──▶ DocumentService
//!                                                                       │
//!                                                                       ▼
//!                                                            DocumentDataMapper
//!                                                         (in-memory │ physical)
//!
//!     Cross-cutting: config, lifecycle (startup/shutdown), observability
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use docuserv::config::{load_config, ServerConfig};
use docuserv::lifecycle::{build_service, Shutdown};
use docuserv::observability::{logging, metrics};
use docuserv::HttpServer;

#[derive(Parser)]
#[command(name = "docuserv")]
#[command(about = "Document store server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_tracing(&config.observability);

    tracing::info!("docuserv v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = config.storage.backend.as_str(),
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let service = build_service(&config.storage).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, service);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
