//! End-to-end tests for the document endpoints.

use std::sync::Arc;

use docuserv::config::{ServerConfig, StorageBackend, StorageConfig};
use docuserv::lifecycle::build_service;
use docuserv::mapper::InMemoryDocumentDataMapper;
use docuserv::service::DocumentService;
use reqwest::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test]
async fn create_retrieve_update_delete() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;
    let client = common::client();

    let res = client
        .post(server.url("/storage/documents"))
        .header("x-documentid", "hello.txt")
        .body("hello world")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.get(server.document_url("hello.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.content_length(), Some(11));
    assert_eq!(res.text().await.unwrap(), "hello world");

    let res = client
        .put(server.url("/storage/documents"))
        .multipart(common::document_form("hello.txt", "goodbye"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(server.document_url("hello.txt")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "goodbye");

    let res = client.delete(server.document_url("hello.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(server.document_url("hello.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn create_without_id_header_is_rejected() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    let res = common::client()
        .post(server.url("/storage/documents"))
        .body("orphan")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.text().await.unwrap(), "document may not be null");
}

#[tokio::test]
async fn create_with_malformed_id_is_rejected() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    for id in ["no-dot", "two.dots.txt", "waytoolongname123.txt"] {
        let res = common::client()
            .post(server.url("/storage/documents"))
            .header("x-documentid", id)
            .body("x")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "id {id}");
    }
    assert!(server.service.retrieve_document("no-dot").await.unwrap().is_none());
}

#[tokio::test]
async fn create_overwrites_existing_document() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;
    let client = common::client();

    for body in ["first", "second"] {
        let res = client
            .post(server.url("/storage/documents"))
            .header("x-documentid", "doc.txt")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client.get(server.document_url("doc.txt")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "second");
}

#[tokio::test]
async fn update_of_missing_document_is_not_found() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    let res = common::client()
        .put(server.url("/storage/documents"))
        .multipart(common::document_form("ghost.txt", "boo"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(server.service.retrieve_document("ghost.txt").await.unwrap().is_none());
}

#[tokio::test]
async fn update_without_document_part_is_rejected() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    let form = reqwest::multipart::Form::new().text("comment", "no file here");
    let res = common::client()
        .put(server.url("/storage/documents"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_target_is_not_found() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    let res = common::client()
        .get(server.url("/storage/documents/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Malformed document request");
}

#[tokio::test]
async fn delete_of_missing_document_succeeds() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    let res = common::client()
        .delete(server.document_url("never.txt"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn large_document_streams_in_small_chunks() {
    let mut config = ServerConfig::default();
    config.transfer.chunk_size = 7;
    config.transfer.response_buffer = 1;
    let server = common::spawn_in_memory(config).await;
    let client = common::client();

    let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let res = client
        .post(server.url("/storage/documents"))
        .header("x-documentid", "big.bin")
        .body(content.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.get(server.document_url("big.bin")).send().await.unwrap();
    assert_eq!(res.content_length(), Some(content.len() as u64));
    assert_eq!(res.bytes().await.unwrap().as_ref(), content.as_slice());
}

#[tokio::test]
async fn request_id_is_propagated() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    let res = common::client()
        .get(server.document_url("none.txt"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");

    let res = common::client().get(server.url("/health")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn health_reports_backend() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    let res = common::client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["backend"], "in_memory");
}

#[tokio::test]
async fn physical_backend_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        backend: StorageBackend::Physical,
        root_dir: dir.path().to_path_buf(),
    };
    let service = build_service(&storage).await.unwrap();
    let server = common::spawn_server(ServerConfig::default(), service).await;
    let client = common::client();

    let res = client
        .post(server.url("/storage/documents"))
        .header("x-documentid", "disk.txt")
        .body("on disk")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(std::fs::read(dir.path().join("disk.txt")).unwrap(), b"on disk");

    let res = client
        .put(server.url("/storage/documents"))
        .multipart(common::document_form("disk.txt", "rewritten"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(server.document_url("disk.txt")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "rewritten");

    let res = client.delete(server.document_url("disk.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(!dir.path().join("disk.txt").exists());

    let res = client.get(server.document_url("disk.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let health: Value = common::client()
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["backend"], "physical");
}

#[tokio::test]
async fn documents_are_visible_through_shared_service() {
    let service = DocumentService::new(Arc::new(InMemoryDocumentDataMapper::new()));
    service
        .create_document(Some("seed.txt"), Some(&b"seeded"[..]))
        .await
        .unwrap();
    let server = common::spawn_server(ServerConfig::default(), service).await;

    let res = common::client().get(server.document_url("seed.txt")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "seeded");
}
