//! In-process HTTP integration tests for the tracker surface: a real
//! `axum::serve` bound to an ephemeral port, exercised with `reqwest`,
//! matching the teacher's preference for driving the real HTTP layer over
//! mocking it.

use std::net::SocketAddr;
use std::sync::Arc;

use mt_core::proto::{AnnounceRequest, ListResponse};
use mt_core::{FileId, PeerId};
use mt_tracker::{JsonStore, Registry};

async fn spawn_tracker() -> (SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path().join("tracker_db.json"));
    let registry = Arc::new(Registry::load(store).await.unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = mt_tracker::http::router(registry);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (addr, dir)
}

#[tokio::test]
async fn announce_without_metadata_on_unknown_file_is_404() {
    let (addr, _dir) = spawn_tracker().await;
    let client = reqwest::Client::new();

    let body = AnnounceRequest {
        peer_id: PeerId::new("peerA"),
        file_id: FileId::from_opaque("0000000000000000"),
        port: 8001,
        chunks: vec![],
        filename: None,
        size: None,
        chunks_total: None,
    };

    let resp = client
        .post(format!("http://{addr}/announce"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn share_then_list_shows_one_active_peer() {
    let (addr, _dir) = spawn_tracker().await;
    let client = reqwest::Client::new();

    let announce = AnnounceRequest {
        peer_id: PeerId::new("peerA"),
        file_id: FileId::from_opaque("deadbeefdeadbeef"),
        port: 8001,
        chunks: vec![0, 1, 2],
        filename: Some("hello.bin".to_string()),
        size: Some(2_097_153),
        chunks_total: Some(3),
    };
    let resp = client
        .post(format!("http://{addr}/announce"))
        .json(&announce)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let listing: ListResponse = client
        .get(format!("http://{addr}/list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let summary = listing.files.get("deadbeefdeadbeef").unwrap();
    assert_eq!(summary.filename, "hello.bin");
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.active_peers, 1);
}

#[tokio::test]
async fn get_file_unknown_is_404() {
    let (addr, _dir) = spawn_tracker().await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/file/0000000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_file_id_returns_16_char_id() {
    let (addr, _dir) = spawn_tracker().await;
    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .post(format!("http://{addr}/generate_file_id"))
        .json(&serde_json::json!({"filename": "hello.bin", "size": 2_097_153u64}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let file_id = resp["file_id"].as_str().unwrap();
    assert_eq!(file_id.len(), 16);
}
