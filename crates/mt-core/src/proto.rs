//! Wire DTOs for the tracker's HTTP surface (`spec.md` SS6). Shared between
//! `mt-tracker`'s handlers and `mt-peer`'s tracker client so both sides agree
//! on field names without hand-copying JSON shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{FileId, PeerId};

/// Body of `POST /announce`.
///
/// `chunks` here means the set of chunk indices this peer currently holds,
/// never a count - the reference implementation overloaded the same field
/// name for both meanings, which `spec.md` calls out as a known defect and
/// resolves by splitting the count into `chunks_total`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceRequest {
    pub peer_id: PeerId,
    pub file_id: FileId,
    pub port: u16,
    #[serde(default)]
    pub chunks: Vec<u32>,
    pub filename: Option<String>,
    pub size: Option<u64>,
    pub chunks_total: Option<u32>,
}

/// Open question from `spec.md` SS9 resolved: the tracker replies with a
/// small, explicit body rather than an empty 200.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceResponse {
    pub ok: bool,
}

/// One entry of `GET /list`'s `files` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub filename: String,
    pub size: u64,
    pub chunks: u32,
    pub active_peers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub files: BTreeMap<String, FileSummary>,
}

/// A single active peer as returned by `GET /file/<file_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerView {
    pub ip: String,
    pub port: u16,
    pub chunks: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfoResponse {
    pub file_id: FileId,
    pub filename: String,
    pub size: u64,
    pub chunks: u32,
    pub peers: BTreeMap<String, PeerView>,
}

impl FileInfoResponse {
    pub fn has_active_peers(&self) -> bool {
        !self.peers.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateFileIdRequest {
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateFileIdResponse {
    pub file_id: FileId,
}

/// Body of `GET /status` on a peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub peer_id: PeerId,
    pub shared_files: BTreeMap<String, SharedFileStatus>,
    pub active_downloads: BTreeMap<String, DownloadStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedFileStatus {
    pub filename: String,
    pub size: u64,
    pub chunks_held: usize,
    pub chunks_total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadStatus {
    pub filename: String,
    pub total_chunks: u32,
    pub downloaded_chunks: usize,
    pub active: bool,
}
