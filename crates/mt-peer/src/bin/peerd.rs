use std::sync::Arc;

use clap::Parser;
use mt_core::logging::{init_logging, InitLoggingOptions};
use mt_core::PeerId;
use mt_peer::cli::{run_shell, Opts};
use mt_peer::{Peer, PeerOptions};
use tracing::error;

/// Peer process for the mini-torrent p2p network: serves chunks of shared
/// files, downloads files other peers seed, and re-announces periodically.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(InitLoggingOptions {
        default_rust_log_value: &opts.log_level,
    })?;

    let peer = Arc::new(Peer::new(PeerOptions {
        peer_id: PeerId::generate(),
        port: opts.port,
        tracker_url: opts.tracker.clone(),
        upload_dir: opts.upload_dir.clone(),
        download_dir: opts.download_dir.clone(),
    }));
    peer.ensure_directories().await?;

    let listen_addr = opts.listen_addr();
    let server_peer = peer.clone();
    tokio::spawn(async move {
        if let Err(e) = server_peer.serve_http(listen_addr).await {
            error!("peer HTTP server error: {e:#}");
        }
    });

    run_shell(&peer).await;
    Ok(())
}
