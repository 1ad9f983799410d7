//! The peer's chunk-serving HTTP surface (`spec.md` SS4.2/SS6):
//! `GET /chunk?file_id=..&chunk_index=..` and `GET /status`.

use std::io::SeekFrom;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mt_core::proto::{DownloadStatus, SharedFileStatus, StatusResponse};
use mt_core::{Error, FileId, PeerId, CHUNK_SIZE};
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tower_http::trace::TraceLayer;

use crate::downloader::Downloads;
use crate::shared_files::SharedFiles;
use crate::splitter::chunk_file_path;

#[derive(Clone)]
pub struct ChunkServerState {
    pub peer_id: PeerId,
    pub shared_files: Arc<SharedFiles>,
    pub active_downloads: Arc<Downloads>,
}

pub fn router(state: ChunkServerState) -> Router {
    Router::new()
        .route("/chunk", get(chunk))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ChunkQuery {
    file_id: String,
    chunk_index: u32,
}

struct ChunkError(Error);

impl IntoResponse for ChunkError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::UnknownFile(_) | Error::UnknownChunk { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Serves one chunk of a locally held file. The last chunk of a file may be
/// shorter than [`CHUNK_SIZE`]; whatever bytes exist are returned.
async fn chunk(
    State(state): State<ChunkServerState>,
    Query(q): Query<ChunkQuery>,
) -> Result<Vec<u8>, ChunkError> {
    let file_id = FileId::from_opaque(q.file_id.clone());
    let shared = state
        .shared_files
        .get_clone(&file_id)
        .ok_or_else(|| ChunkError(Error::UnknownFile(q.file_id.clone())))?;

    if let Some(whole_file) = &shared.whole_file {
        let mut f = tokio::fs::File::open(whole_file)
            .await
            .map_err(|e| ChunkError(e.into()))?;
        f.seek(SeekFrom::Start(q.chunk_index as u64 * CHUNK_SIZE))
            .await
            .map_err(|e| ChunkError(e.into()))?;
        let mut buf = vec![0u8; CHUNK_SIZE as usize];
        let mut filled = 0;
        loop {
            let n = f
                .read(&mut buf[filled..])
                .await
                .map_err(|e| ChunkError(e.into()))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        return Ok(buf);
    }

    let chunk_path = chunk_file_path(&shared.chunk_dir, &shared.filename, q.chunk_index);
    match tokio::fs::read(&chunk_path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ChunkError(Error::UnknownChunk {
            file_id: q.file_id,
            chunk_index: q.chunk_index,
        })),
        Err(e) => Err(ChunkError(e.into())),
    }
}

async fn status(State(state): State<ChunkServerState>) -> Json<StatusResponse> {
    let shared_files = state
        .shared_files
        .snapshot()
        .into_iter()
        .map(|(id, s)| {
            (
                id.to_string(),
                SharedFileStatus {
                    filename: s.filename,
                    size: s.size,
                    chunks_held: s.chunks_held.len(),
                    chunks_total: s.chunks_total,
                },
            )
        })
        .collect();

    let active_downloads = state
        .active_downloads
        .snapshot()
        .into_iter()
        .map(|(id, d)| {
            (
                id.to_string(),
                DownloadStatus {
                    filename: d.filename,
                    total_chunks: d.total_chunks,
                    downloaded_chunks: d.downloaded_chunks,
                    active: d.active,
                },
            )
        })
        .collect();

    Json(StatusResponse {
        peer_id: state.peer_id.clone(),
        shared_files,
        active_downloads,
    })
}
