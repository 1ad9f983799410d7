//! The download state machine (`spec.md` SS4.4): drives a `DownloadState`
//! from empty to complete by fetching chunks from peers, ascending by
//! index, with peer-exhausted retry and an in-memory merge on completion.
//! Grounded on `original_source/peer1.py::download_file` /
//! `download_chunks_from_peers` / `merge_chunks`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mt_core::constants::{CHUNK_FETCH_TIMEOUT, CHUNK_RETRY_DELAY};
use mt_core::proto::{AnnounceRequest, PeerView};
use mt_core::{Error, FileId, PeerId, Result};
use tokio::io::AsyncWriteExt;
use tracing::{info, info_span, warn};

use crate::announcer::Announcer;
use crate::client::TrackerClient;
use crate::shared_files::{SharedFile, SharedFiles};
use crate::splitter::chunk_file_path;
use crate::task::spawn_logged;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Peer-local state for one file being fetched (`spec.md` SS3).
#[derive(Debug, Clone)]
pub struct DownloadState {
    pub filename: String,
    pub total_chunks: u32,
    pub downloaded_chunks: BTreeSet<u32>,
    pub active: bool,
    pub started_at: u64,
}

/// Read-only view handed to the status endpoint; avoids leaking the
/// worker-owned `BTreeSet` past the downloads lock.
#[derive(Debug, Clone)]
pub struct DownloadSnapshot {
    pub filename: String,
    pub total_chunks: u32,
    pub downloaded_chunks: usize,
    pub active: bool,
}

/// All of a peer's in-flight downloads, one lock for the whole map
/// (`spec.md` SS5: "Peer `active_downloads` ... Single lock").
#[derive(Default)]
pub struct Downloads {
    inner: parking_lot::Mutex<HashMap<FileId, Arc<parking_lot::Mutex<DownloadState>>>>,
}

impl Downloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn handle_for(
        &self,
        file_id: &FileId,
    ) -> Option<Arc<parking_lot::Mutex<DownloadState>>> {
        self.inner.lock().get(file_id).cloned()
    }

    pub fn insert(&self, file_id: FileId, state: DownloadState) {
        self.inner
            .lock()
            .insert(file_id, Arc::new(parking_lot::Mutex::new(state)));
    }

    pub fn get_clone(&self, file_id: &FileId) -> Option<DownloadState> {
        self.handle_for(file_id).map(|h| h.lock().clone())
    }

    pub fn is_active(&self, file_id: &FileId) -> bool {
        self.handle_for(file_id)
            .map(|h| h.lock().active)
            .unwrap_or(false)
    }

    /// Handles CLI `cancel <file_id>`. Returns `false` if no such download
    /// is known - the worker only observes this at the next chunk boundary.
    pub fn cancel(&self, file_id: &FileId) -> bool {
        match self.handle_for(file_id) {
            Some(h) => {
                h.lock().active = false;
                true
            }
            None => false,
        }
    }

    fn record_chunk(&self, file_id: &FileId, chunk_index: u32) {
        if let Some(h) = self.handle_for(file_id) {
            h.lock().downloaded_chunks.insert(chunk_index);
        }
    }

    pub fn snapshot(&self) -> HashMap<FileId, DownloadSnapshot> {
        self.inner
            .lock()
            .iter()
            .map(|(id, h)| {
                let s = h.lock();
                (
                    id.clone(),
                    DownloadSnapshot {
                        filename: s.filename.clone(),
                        total_chunks: s.total_chunks,
                        downloaded_chunks: s.downloaded_chunks.len(),
                        active: s.active,
                    },
                )
            })
            .collect()
    }
}

/// What the CLI / `download` handler reports back immediately after
/// starting a download - the slow part (fetching chunks) runs in the
/// background task spawned by [`Downloader::start`].
pub struct StartedDownload {
    pub filename: String,
    pub total_chunks: u32,
}

#[derive(Clone)]
pub struct Downloader {
    pub peer_id: PeerId,
    pub port: u16,
    pub tracker: TrackerClient,
    pub peer_http: reqwest::Client,
    pub download_dir: PathBuf,
    pub downloads: Arc<Downloads>,
    pub shared_files: Arc<SharedFiles>,
    pub announcer: Announcer,
}

impl Downloader {
    /// **Initialized** state (`spec.md` SS4.4): fetches file info from the
    /// tracker and fails `NoPeers` if it has none to offer, matching SS7's
    /// rule that a `TrackerUnavailable` in this path also surfaces as
    /// `NoPeers` rather than its own typed error. On success, registers the
    /// `DownloadState` and spawns the **Fetching** worker.
    pub async fn start(&self, file_id: FileId) -> Result<StartedDownload> {
        let info = self
            .tracker
            .get_file(&file_id)
            .await
            .map_err(|_| Error::NoPeers(file_id.to_string()))?;

        if !info.has_active_peers() {
            return Err(Error::NoPeers(file_id.to_string()));
        }

        self.downloads.insert(
            file_id.clone(),
            DownloadState {
                filename: info.filename.clone(),
                total_chunks: info.chunks,
                downloaded_chunks: BTreeSet::new(),
                active: true,
                started_at: unix_now(),
            },
        );

        let started = StartedDownload {
            filename: info.filename.clone(),
            total_chunks: info.chunks,
        };

        let this = self.clone();
        let filename = info.filename;
        let total_chunks = info.chunks;
        let peers = info.peers;
        spawn_logged(info_span!("downloader", file_id = %file_id), async move {
            this.run(file_id, filename, total_chunks, peers).await;
        });

        Ok(started)
    }

    /// **Fetching** -> **Cancelled** | **Complete**. Acquires chunks in
    /// strictly ascending order; a chunk with no holding peer triggers a
    /// 5s sleep and a peer-set refresh before resuming at the same index.
    async fn run(
        &self,
        file_id: FileId,
        filename: String,
        total_chunks: u32,
        mut peers: BTreeMap<String, PeerView>,
    ) {
        // At-start announce: registers the leecher as a zero-chunk peer so
        // the tracker's peer set for this file includes it immediately.
        self.announce_progress(&file_id).await;

        let mut i: u32 = 0;
        while i < total_chunks {
            if !self.downloads.is_active(&file_id) {
                info!("download cancelled, worker exiting");
                return;
            }

            if self.acquire_chunk(&file_id, &filename, i, &peers).await {
                i += 1;
                continue;
            }

            info!(chunk_index = i, "no peer has this chunk yet, retrying after delay");
            tokio::time::sleep(CHUNK_RETRY_DELAY).await;

            match self.tracker.get_file(&file_id).await {
                Ok(info) => peers = info.peers,
                Err(e) => warn!(error = %e, "failed to refresh peer list from tracker"),
            }
        }

        self.complete(&file_id, &filename, total_chunks).await;
    }

    /// One scan over the cached peer set for a single chunk index: first
    /// peer claiming to hold it wins (`spec.md` SS4.4 tie-breaking rule).
    async fn acquire_chunk(
        &self,
        file_id: &FileId,
        filename: &str,
        chunk_index: u32,
        peers: &BTreeMap<String, PeerView>,
    ) -> bool {
        for (peer_id, peer) in peers {
            if !peer.chunks.contains(&chunk_index) {
                continue;
            }

            let url = format!("http://{}:{}/chunk", peer.ip, peer.port);
            let resp = self
                .peer_http
                .get(&url)
                .query(&[
                    ("file_id", file_id.as_str()),
                    ("chunk_index", &chunk_index.to_string()),
                ])
                .timeout(CHUNK_FETCH_TIMEOUT)
                .send()
                .await;

            let body = match resp {
                Ok(r) if r.status().is_success() => match r.bytes().await {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(peer = %peer_id, error = %e, "failed reading chunk body");
                        continue;
                    }
                },
                Ok(r) => {
                    warn!(peer = %peer_id, status = %r.status(), "peer returned non-success for chunk");
                    continue;
                }
                Err(e) => {
                    warn!(peer = %peer_id, error = %e, "chunk fetch failed");
                    continue;
                }
            };

            let path = chunk_file_path(&self.download_dir, filename, chunk_index);
            if let Some(parent) = path.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    warn!(error = %e, "failed creating download directory");
                    continue;
                }
            }
            if let Err(e) = tokio::fs::write(&path, &body).await {
                warn!(error = %e, "failed writing chunk to disk");
                continue;
            }

            self.downloads.record_chunk(file_id, chunk_index);
            info!(chunk_index, peer = %peer_id, "chunk downloaded");
            self.announce_progress(file_id).await;
            return true;
        }
        false
    }

    /// Best-effort re-announce of `downloaded_chunks` after every new
    /// chunk (`spec.md` SS4.4/SS7: `PeerUnavailable`/`TrackerUnavailable`
    /// here are never surfaced, only logged).
    async fn announce_progress(&self, file_id: &FileId) {
        let Some(state) = self.downloads.get_clone(file_id) else {
            return;
        };
        let req = AnnounceRequest {
            peer_id: self.peer_id.clone(),
            file_id: file_id.clone(),
            port: self.port,
            chunks: state.downloaded_chunks.into_iter().collect(),
            filename: None,
            size: None,
            chunks_total: None,
        };
        if let Err(e) = self.tracker.announce(&req).await {
            warn!(error = %e, "best-effort download progress announce failed");
        }
    }

    /// **Complete**: merges `<filename>.0..n-1` into a single file, deletes
    /// the chunk files, and registers the result as a new `SharedFile` so
    /// this peer becomes an additional seed.
    async fn complete(&self, file_id: &FileId, filename: &str, total_chunks: u32) {
        let output_path = self.download_dir.join(filename);

        if let Err(e) =
            merge_chunks_in_order(&self.download_dir, filename, total_chunks, &output_path).await
        {
            warn!(error = %e, "download reached completion but merge failed");
            return;
        }

        let size = match tokio::fs::metadata(&output_path).await {
            Ok(m) => m.len(),
            Err(e) => {
                warn!(error = %e, "failed to stat merged file");
                return;
            }
        };

        self.shared_files.insert(
            file_id.clone(),
            SharedFile {
                filename: filename.to_string(),
                size,
                chunks_total: total_chunks,
                chunks_held: (0..total_chunks).collect(),
                whole_file: Some(output_path),
                chunk_dir: self.download_dir.clone(),
            },
        );
        self.announcer.spawn_for(file_id.clone());
        info!(filename, "download complete, now seeding");
    }
}

/// In-memory merge used only by the downloader's completion path - distinct
/// from the standalone `mt-merge` collaborator in [`crate::merge`], which
/// globs for chunk files instead of knowing `total_chunks` up front.
async fn merge_chunks_in_order(
    dir: &std::path::Path,
    filename: &str,
    total_chunks: u32,
    output_path: &std::path::Path,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut out = tokio::fs::File::create(output_path).await?;
    for i in 0..total_chunks {
        let chunk_path = chunk_file_path(dir, filename, i);
        let bytes =
            tokio::fs::read(&chunk_path)
                .await
                .map_err(|_| Error::MergeCorruption {
                    filename: filename.to_string(),
                    chunk_index: i,
                })?;
        out.write_all(&bytes).await?;
    }
    out.flush().await?;
    drop(out);

    for i in 0..total_chunks {
        let _ = tokio::fs::remove_file(chunk_file_path(dir, filename, i)).await;
    }
    Ok(())
}
