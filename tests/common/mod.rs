//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use docuserv::config::ServerConfig;
use docuserv::http::HttpServer;
use docuserv::lifecycle::Shutdown;
use docuserv::mapper::InMemoryDocumentDataMapper;
use docuserv::service::DocumentService;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral port, stopped on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub service: DocumentService,
    shutdown: Shutdown,
    handle: Option<JoinHandle<()>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn document_url(&self, id: &str) -> String {
        self.url(&format!("/storage/documents/{id}"))
    }

    pub async fn stop(mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server with `config` over an in-memory store.
#[allow(dead_code)]
pub async fn spawn_in_memory(config: ServerConfig) -> TestServer {
    let service = DocumentService::new(Arc::new(InMemoryDocumentDataMapper::new()));
    spawn_server(config, service).await
}

/// Start a server with `config` over `service`, bound to 127.0.0.1:0.
pub async fn spawn_server(config: ServerConfig, service: DocumentService) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, service.clone());
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        service,
        shutdown,
        handle: Some(handle),
    }
}

/// Client without pooling so each test request opens its own connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Multipart form carrying `content` as the `document` part named `id`.
#[allow(dead_code)]
pub fn document_form(id: &str, content: impl Into<Vec<u8>>) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(content.into()).file_name(id.to_string());
    reqwest::multipart::Form::new().part("document", part)
}
