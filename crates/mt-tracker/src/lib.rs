pub mod http;
pub mod persistence;
pub mod registry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

pub use persistence::JsonStore;
pub use registry::Registry;

/// Runs the tracker's HTTP server forever on `listen_addr`, logging the
/// bound address (useful when `listen_addr`'s port is 0).
pub async fn serve(registry: Arc<Registry>, listen_addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind tracker HTTP server on {listen_addr}"))?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "tracker HTTP server listening");

    let app = http::router(registry);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("tracker HTTP server exited")
}
