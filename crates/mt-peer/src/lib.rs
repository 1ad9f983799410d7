//! Peer library: chunk server, splitter, downloader state machine, periodic
//! announcer, and tracker client (`spec.md` SS4.2-SS4.5). The `peerd` and
//! `mt-merge` binaries are thin wrappers around this crate (SS4.6/SS4.7).

pub mod announcer;
pub mod chunk_server;
pub mod cli;
pub mod client;
pub mod downloader;
pub mod merge;
pub mod shared_files;
pub mod splitter;
pub mod task;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use mt_core::proto::AnnounceRequest;
use mt_core::PeerId;
use tokio::net::TcpListener;
use tracing::info;

pub use announcer::Announcer;
pub use chunk_server::ChunkServerState;
pub use client::TrackerClient;
pub use downloader::{DownloadState, Downloader, Downloads};
pub use shared_files::{SharedFile, SharedFiles};
pub use splitter::SplitFile;

pub struct PeerOptions {
    pub peer_id: PeerId,
    pub port: u16,
    pub tracker_url: String,
    pub upload_dir: PathBuf,
    pub download_dir: PathBuf,
}

/// Everything a running peer process needs, threaded into the HTTP server,
/// the downloader, and the CLI alike. Cheap to clone - every field is
/// either `Copy`, an `Arc`, or itself a clonable handle.
#[derive(Clone)]
pub struct Peer {
    pub peer_id: PeerId,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub download_dir: PathBuf,
    pub tracker: TrackerClient,
    pub shared_files: Arc<SharedFiles>,
    pub downloads: Arc<Downloads>,
    pub announcer: Announcer,
    pub downloader: Downloader,
}

impl Peer {
    pub fn new(opts: PeerOptions) -> Self {
        let tracker = TrackerClient::new(opts.tracker_url);
        let shared_files = Arc::new(SharedFiles::new());
        let downloads = Arc::new(Downloads::new());

        let announcer = Announcer {
            peer_id: opts.peer_id.clone(),
            port: opts.port,
            tracker: tracker.clone(),
            shared_files: shared_files.clone(),
        };

        let downloader = Downloader {
            peer_id: opts.peer_id.clone(),
            port: opts.port,
            tracker: tracker.clone(),
            peer_http: reqwest::Client::builder()
                .build()
                .expect("reqwest client builder should not fail with no TLS config"),
            download_dir: opts.download_dir.clone(),
            downloads: downloads.clone(),
            shared_files: shared_files.clone(),
            announcer: announcer.clone(),
        };

        Self {
            peer_id: opts.peer_id,
            port: opts.port,
            upload_dir: opts.upload_dir,
            download_dir: opts.download_dir,
            tracker,
            shared_files,
            downloads,
            announcer,
            downloader,
        }
    }

    /// Ensures `uploads/` and `downloads/` exist before the HTTP server or
    /// CLI touch them.
    pub async fn ensure_directories(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.download_dir).await?;
        Ok(())
    }

    /// Splits `path`, registers the new `FileId` with the tracker (the
    /// initializing announce from `spec.md` SS2), records it as a
    /// `SharedFile`, and starts its periodic announcer (SS4.3/SS4.5).
    pub async fn share(&self, path: &std::path::Path) -> anyhow::Result<SplitFile> {
        let split = splitter::split_file(path, &self.upload_dir).await?;

        let req = AnnounceRequest {
            peer_id: self.peer_id.clone(),
            file_id: split.file_id.clone(),
            port: self.port,
            chunks: (0..split.num_chunks).collect(),
            filename: Some(split.filename.clone()),
            size: Some(split.size),
            chunks_total: Some(split.num_chunks),
        };
        self.tracker.announce(&req).await?;

        self.shared_files.insert(
            split.file_id.clone(),
            SharedFile {
                filename: split.filename.clone(),
                size: split.size,
                chunks_total: split.num_chunks,
                chunks_held: (0..split.num_chunks).collect(),
                whole_file: None,
                chunk_dir: self.upload_dir.clone(),
            },
        );
        self.announcer.spawn_for(split.file_id.clone());

        Ok(split)
    }

    /// Runs the peer's chunk-serving HTTP surface forever (`spec.md` SS4.2
    /// / SS6: `GET /chunk`, `GET /status`).
    pub async fn serve_http(&self, listen_addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(listen_addr)
            .await
            .with_context(|| format!("failed to bind peer HTTP server on {listen_addr}"))?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "peer HTTP server listening");

        let state = ChunkServerState {
            peer_id: self.peer_id.clone(),
            shared_files: self.shared_files.clone(),
            active_downloads: self.downloads.clone(),
        };
        let app = chunk_server::router(state);
        axum::serve(listener, app.into_make_service())
            .await
            .context("peer HTTP server exited")
    }
}
