//! The tracker's authoritative view of files and the peers that hold their
//! chunks (`spec.md` SS3/SS4.1). A single [`Registry`] instance is shared by
//! every HTTP handler behind one lock, so announce/list/get_file observe a
//! consistent snapshot and mutating writers never tear the persisted file.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use mt_core::proto::{AnnounceRequest, FileInfoResponse, FileSummary, ListResponse, PeerView};
use mt_core::{chunk_count, Error, FileId, PeerId, Result};
use serde::{Deserialize, Serialize};

use crate::persistence::JsonStore;

/// Per-file record kept by the tracker. `size`/`chunks` are fixed at
/// creation and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub size: u64,
    pub created_at: u64,
    pub chunks: u32,
    pub peers: IndexMap<PeerId, PeerEntry>,
}

/// Per-peer, per-file entry. Fully replaced (never merged) on each announce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEntry {
    pub ip: String,
    pub port: u16,
    pub last_seen: u64,
    pub chunks: BTreeSet<u32>,
}

impl PeerEntry {
    fn is_active(&self, now: u64) -> bool {
        now.saturating_sub(self.last_seen) < mt_core::constants::PEER_LIVENESS_WINDOW.as_secs()
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The whole registry, as it is persisted to disk: an ordered map so the
/// on-disk JSON has stable, diff-friendly key ordering (insertion order,
/// not re-sorted on every announce).
type Document = IndexMap<FileId, FileRecord>;

pub struct Registry {
    state: tokio::sync::Mutex<Document>,
    store: JsonStore,
}

impl Registry {
    pub async fn load(store: JsonStore) -> anyhow::Result<Self> {
        let doc = store.load().await?;
        Ok(Self {
            state: tokio::sync::Mutex::new(doc),
            store,
        })
    }

    /// Handles `POST /announce`. Creates the `FileRecord` on first sight if
    /// `filename`/`size`/`chunks_total` are all present, otherwise fails
    /// `UnknownFile`. The registry is flushed to disk before returning,
    /// matching SS4.1's "entire registry is persisted before the response
    /// returns".
    pub async fn announce(
        &self,
        ip: IpAddr,
        req: AnnounceRequest,
        now: u64,
    ) -> Result<()> {
        let mut doc = self.state.lock().await;

        if !doc.contains_key(&req.file_id) {
            match (req.filename.clone(), req.size, req.chunks_total) {
                (Some(filename), Some(size), Some(chunks_total)) => {
                    let expected = chunk_count(size);
                    let chunks = if chunks_total > 0 { chunks_total } else { expected };
                    doc.insert(
                        req.file_id.clone(),
                        FileRecord {
                            filename,
                            size,
                            created_at: now,
                            chunks,
                            peers: IndexMap::new(),
                        },
                    );
                }
                _ => return Err(Error::UnknownFile(req.file_id.to_string())),
            }
        }

        let record = doc
            .get_mut(&req.file_id)
            .expect("just inserted or already present");
        record.peers.insert(
            req.peer_id.clone(),
            PeerEntry {
                ip: ip.to_string(),
                port: req.port,
                last_seen: now,
                chunks: req.chunks.into_iter().collect(),
            },
        );

        self.store.save(&doc).await?;
        Ok(())
    }

    /// Handles `GET /list`: every file, with a live `active_peers` count.
    pub async fn list(&self, now: u64) -> ListResponse {
        let doc = self.state.lock().await;
        let files = doc
            .iter()
            .map(|(id, record)| {
                let active_peers = record.peers.values().filter(|p| p.is_active(now)).count();
                (
                    id.to_string(),
                    FileSummary {
                        filename: record.filename.clone(),
                        size: record.size,
                        chunks: record.chunks,
                        active_peers,
                    },
                )
            })
            .collect();
        ListResponse { files }
    }

    /// Handles `GET /file/<file_id>`: metadata plus active peers only.
    pub async fn get_file(&self, file_id: &FileId, now: u64) -> Result<FileInfoResponse> {
        let doc = self.state.lock().await;
        let record = doc
            .get(file_id)
            .ok_or_else(|| Error::UnknownFile(file_id.to_string()))?;

        let peers = record
            .peers
            .iter()
            .filter(|(_, p)| p.is_active(now))
            .map(|(id, p)| {
                (
                    id.to_string(),
                    PeerView {
                        ip: p.ip.clone(),
                        port: p.port,
                        chunks: p.chunks.iter().copied().collect(),
                    },
                )
            })
            .collect();

        Ok(FileInfoResponse {
            file_id: file_id.clone(),
            filename: record.filename.clone(),
            size: record.size,
            chunks: record.chunks,
            peers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn announce_req(
        peer_id: &str,
        file_id: &str,
        port: u16,
        chunks: Vec<u32>,
        meta: Option<(&str, u64, u32)>,
    ) -> AnnounceRequest {
        AnnounceRequest {
            peer_id: PeerId::new(peer_id),
            file_id: FileId::from_opaque(file_id),
            port,
            chunks,
            filename: meta.map(|m| m.0.to_string()),
            size: meta.map(|m| m.1),
            chunks_total: meta.map(|m| m.2),
        }
    }

    async fn new_registry() -> (Registry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("tracker_db.json"));
        let registry = Registry::load(store).await.unwrap();
        (registry, dir)
    }

    fn localhost() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[tokio::test]
    async fn announce_unknown_file_without_metadata_fails() {
        let (registry, _dir) = new_registry().await;
        let req = announce_req("peerA", "deadbeefdeadbeef", 8001, vec![], None);
        let err = registry.announce(localhost(), req, 1000).await.unwrap_err();
        assert!(matches!(err, Error::UnknownFile(_)));
    }

    #[tokio::test]
    async fn announce_creates_file_with_metadata_then_updates_peer() {
        let (registry, _dir) = new_registry().await;
        let file_id = "deadbeefdeadbeef";

        let create = announce_req(
            "peerA",
            file_id,
            8001,
            vec![],
            Some(("hello.bin", 2_097_153, 3)),
        );
        registry.announce(localhost(), create, 1000).await.unwrap();

        let update = announce_req("peerA", file_id, 8001, vec![0, 1], None);
        registry.announce(localhost(), update, 1010).await.unwrap();

        let info = registry
            .get_file(&FileId::from_opaque(file_id), 1010)
            .await
            .unwrap();
        assert_eq!(info.filename, "hello.bin");
        assert_eq!(info.size, 2_097_153);
        assert_eq!(info.chunks, 3);
        let peer = info.peers.get("peerA").unwrap();
        assert_eq!(peer.chunks, vec![0, 1]);
    }

    #[tokio::test]
    async fn list_filters_inactive_peers_but_keeps_file_metadata() {
        let (registry, _dir) = new_registry().await;
        let file_id = "deadbeefdeadbeef";
        let create = announce_req(
            "peerA",
            file_id,
            8001,
            vec![0, 1, 2],
            Some(("hello.bin", 2_097_153, 3)),
        );
        registry.announce(localhost(), create, 0).await.unwrap();

        // 350s later, peerA's last_seen (t=0) is stale (> 300s window).
        let listing = registry.list(350).await;
        let summary = listing.files.get(file_id).unwrap();
        assert_eq!(summary.active_peers, 0);

        let info = registry
            .get_file(&FileId::from_opaque(file_id), 350)
            .await
            .unwrap();
        assert_eq!(info.filename, "hello.bin");
        assert!(info.peers.is_empty());
    }

    #[tokio::test]
    async fn announce_is_idempotent_in_structure() {
        let (registry, _dir) = new_registry().await;
        let file_id = "deadbeefdeadbeef";
        let create = announce_req(
            "peerA",
            file_id,
            8001,
            vec![0],
            Some(("hello.bin", 2_097_153, 3)),
        );
        registry.announce(localhost(), create.clone(), 100).await.unwrap();
        registry.announce(localhost(), create, 200).await.unwrap();

        let info = registry
            .get_file(&FileId::from_opaque(file_id), 200)
            .await
            .unwrap();
        assert_eq!(info.peers.len(), 1);
        assert_eq!(info.peers.get("peerA").unwrap().chunks, vec![0]);
    }

    #[tokio::test]
    async fn size_and_chunks_are_immutable_after_creation() {
        let (registry, _dir) = new_registry().await;
        let file_id = "deadbeefdeadbeef";
        let create = announce_req(
            "peerA",
            file_id,
            8001,
            vec![],
            Some(("hello.bin", 2_097_153, 3)),
        );
        registry.announce(localhost(), create, 0).await.unwrap();

        // Re-announcing with different (ignored) metadata must not perturb
        // the already-registered size/chunks - the file already exists, so
        // the (filename, size, chunks_total) fields are only consulted at
        // creation time.
        let again = announce_req(
            "peerB",
            file_id,
            8002,
            vec![],
            Some(("hello.bin", 999, 99)),
        );
        registry.announce(localhost(), again, 10).await.unwrap();

        let info = registry
            .get_file(&FileId::from_opaque(file_id), 10)
            .await
            .unwrap();
        assert_eq!(info.size, 2_097_153);
        assert_eq!(info.chunks, 3);
    }
}
