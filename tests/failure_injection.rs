//! Failure injection tests: oversized bodies and clients that vanish
//! mid-transfer.

use std::time::Duration;

use docuserv::config::ServerConfig;
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

/// Send a POST announcing `announced` bytes, deliver only `sent`, then hang
/// up and wait for the server to close its side.
async fn abandoned_upload(addr: std::net::SocketAddr, id: &str, announced: usize, sent: &[u8]) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "POST /storage/documents HTTP/1.1\r\nHost: {addr}\r\nx-documentid: {id}\r\nContent-Length: {announced}\r\n\r\n"
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(sent).await.unwrap();
    stream.flush().await.unwrap();
    stream.shutdown().await.unwrap();

    let mut sink = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut sink)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn truncated_upload_stores_nothing() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;

    abandoned_upload(server.addr, "cut.txt", 100, b"only ten b").await;

    assert!(server.service.retrieve_document("cut.txt").await.unwrap().is_none());

    let res = common::client().get(server.document_url("cut.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn truncated_overwrite_keeps_previous_content() {
    let server = common::spawn_in_memory(ServerConfig::default()).await;
    server
        .service
        .create_document(Some("keep.txt"), Some(&b"original"[..]))
        .await
        .unwrap();

    abandoned_upload(server.addr, "keep.txt", 64, b"partial").await;

    let res = common::client().get(server.document_url("keep.txt")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "original");
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let mut config = ServerConfig::default();
    config.transfer.max_document_bytes = 1024;
    let server = common::spawn_in_memory(config).await;

    let res = common::client()
        .post(server.url("/storage/documents"))
        .header("x-documentid", "huge.bin")
        .body(vec![0u8; 4096])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.service.retrieve_document("huge.bin").await.unwrap().is_none());
}

#[tokio::test]
async fn consumer_leaving_mid_download_does_not_disturb_store() {
    let mut config = ServerConfig::default();
    config.transfer.chunk_size = 16;
    config.transfer.response_buffer = 1;
    let server = common::spawn_in_memory(config).await;

    let content = vec![7u8; 256 * 1024];
    server
        .service
        .create_document(Some("slow.bin"), Some(content.as_slice()))
        .await
        .unwrap();

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let head = format!(
        "GET /storage/documents/slow.bin HTTP/1.1\r\nHost: {}\r\n\r\n",
        server.addr
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    let mut first = [0u8; 64];
    let n = stream.read(&mut first).await.unwrap();
    assert!(std::str::from_utf8(&first[..n]).unwrap_or("").starts_with("HTTP/1.1 200"));
    drop(stream);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let res = common::client().get(server.document_url("slow.bin")).send().await.unwrap();
    assert_eq!(res.bytes().await.unwrap().len(), content.len());
}
