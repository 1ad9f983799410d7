//! The tracker's HTTP surface (`spec.md` SS6): `POST /announce`, `GET /list`,
//! `GET /file/<file_id>`, `POST /generate_file_id`. Routing and handler
//! shape follow the teacher's `http_api.rs` (axum `Router` + `State`,
//! one small async fn per route, errors funneled through an `IntoResponse`
//! newtype).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mt_core::proto::{
    AnnounceRequest, AnnounceResponse, FileInfoResponse, GenerateFileIdRequest,
    GenerateFileIdResponse, ListResponse,
};
use mt_core::{Error, FileId};
use tower_http::trace::TraceLayer;

use crate::registry::{unix_now, Registry};

/// Thin `IntoResponse` wrapper mapping the shared [`mt_core::Error`]
/// taxonomy onto the status codes `spec.md` SS7 specifies.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::BadRequest => StatusCode::BAD_REQUEST,
            Error::UnknownFile(_) | Error::UnknownChunk { .. } => StatusCode::NOT_FOUND,
            Error::NoPeers(_) => StatusCode::NOT_FOUND,
            Error::MergeCorruption { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/announce", post(announce))
        .route("/list", get(list))
        .route("/file/{file_id}", get(get_file))
        .route("/generate_file_id", post(generate_file_id))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn announce(
    State(registry): State<Arc<Registry>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<AnnounceRequest>,
) -> Result<Json<AnnounceResponse>, ApiError> {
    registry.announce(addr.ip(), req, unix_now()).await?;
    Ok(Json(AnnounceResponse { ok: true }))
}

async fn list(State(registry): State<Arc<Registry>>) -> Json<ListResponse> {
    Json(registry.list(unix_now()).await)
}

async fn get_file(
    State(registry): State<Arc<Registry>>,
    Path(file_id): Path<String>,
) -> Result<Json<FileInfoResponse>, ApiError> {
    let file_id = FileId::from_opaque(file_id);
    let info = registry.get_file(&file_id, unix_now()).await?;
    Ok(Json(info))
}

/// `/generate_file_id` is a stateless convenience mirroring the peer's own
/// local id derivation (`spec.md` SS4.3/SS6); the tracker never consults it
/// when handling `announce`.
async fn generate_file_id(Json(req): Json<GenerateFileIdRequest>) -> Json<GenerateFileIdResponse> {
    let file_id = FileId::generate(&req.filename, req.size, SystemTime::now());
    Json(GenerateFileIdResponse { file_id })
}
