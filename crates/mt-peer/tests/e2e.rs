//! End-to-end scenarios from `spec.md` §8: a tracker plus two peers talking
//! real HTTP over loopback sockets bound to port 0, mirroring the teacher's
//! `tests/e2e.rs` style of driving the real stack rather than mocking it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mt_core::{FileId, PeerId};
use mt_peer::{Peer, PeerOptions};

async fn spawn_tracker() -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = mt_tracker::JsonStore::new(dir.path().join("tracker_db.json"));
    let registry = Arc::new(mt_tracker::Registry::load(store).await.unwrap());

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
    (format!("http://{addr}"), dir)
}

/// Binds the peer's chunk-server listener on an OS-assigned port first, then
/// builds the `Peer` around that same port - avoids the bind-release-rebind
/// race of reserving a port number ahead of time.
async fn spawn_peer(tracker_url: &str, peer_id: &str) -> (Arc<Peer>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let peer = Arc::new(Peer::new(PeerOptions {
        peer_id: PeerId::new(peer_id),
        port,
        tracker_url: tracker_url.to_string(),
        upload_dir: dir.path().join("uploads"),
        download_dir: dir.path().join("downloads"),
    }));
    peer.ensure_directories().await.unwrap();

    let state = mt_peer::ChunkServerState {
        peer_id: peer.peer_id.clone(),
        shared_files: peer.shared_files.clone(),
        active_downloads: peer.downloads.clone(),
    };
    let app = mt_peer::chunk_server::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    (peer, dir)
}

#[tokio::test]
async fn round_trip_single_peer_download_is_byte_identical() {
    let (tracker_url, _tracker_dir) = spawn_tracker().await;

    let (seed, seed_dir) = spawn_peer(&tracker_url, "seedA").await;

    // 2 full 1MiB chunks + 1 trailing byte, matching spec.md's example.
    let data: Vec<u8> = (0..2_097_153u32).map(|i| (i % 251) as u8).collect();
    let source_path = seed_dir.path().join("hello.bin");
    tokio::fs::write(&source_path, &data).await.unwrap();

    let split = seed.share(&source_path).await.unwrap();
    assert_eq!(split.num_chunks, 3);

    // Give the HTTP servers a moment to accept connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (leecher, leecher_dir) = spawn_peer(&tracker_url, "leechB").await;

    let started = leecher.downloader.start(split.file_id.clone()).await.unwrap();
    assert_eq!(started.filename, "hello.bin");
    assert_eq!(started.total_chunks, 3);

    let output_path = leecher_dir.path().join("downloads").join("hello.bin");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if tokio::fs::metadata(&output_path).await.is_ok() {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "download did not complete in time");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let downloaded = tokio::fs::read(&output_path).await.unwrap();
    assert_eq!(downloaded, data);

    // The leecher becomes an additional seed: get_file should now list 2
    // active peers once its first post-completion announce lands.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let info = seed.tracker.get_file(&split.file_id).await.unwrap();
        if info.peers.len() == 2 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "leecher never reappeared as a seed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn download_of_unknown_file_fails_with_no_peers() {
    let (tracker_url, _tracker_dir) = spawn_tracker().await;
    let (peer, _dir) = spawn_peer(&tracker_url, "lonelyC").await;

    let err = peer
        .downloader
        .start(FileId::from_opaque("0000000000000000"))
        .await
        .unwrap_err();
    assert!(matches!(err, mt_core::Error::NoPeers(_)));
}

#[tokio::test]
async fn share_registers_file_with_one_active_peer() {
    let (tracker_url, _tracker_dir) = spawn_tracker().await;
    let (peer, dir) = spawn_peer(&tracker_url, "seedD").await;

    let path = dir.path().join("small.bin");
    tokio::fs::write(&path, vec![9u8; 10]).await.unwrap();
    let split = peer.share(&path).await.unwrap();

    let listing = peer.tracker.list().await.unwrap();
    let summary = listing.files.get(split.file_id.as_str()).unwrap();
    assert_eq!(summary.filename, "small.bin");
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.active_peers, 1);
}
