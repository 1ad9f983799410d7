use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mt_core::logging::{init_logging, InitLoggingOptions};
use mt_tracker::{JsonStore, Registry};
use tracing::{error, info};

/// Tracker process for the mini-torrent p2p network: maintains the file
/// registry and answers peer announce/list/get-file requests.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Opts {
    /// Address to listen for peer HTTP requests on.
    #[arg(long, default_value = "0.0.0.0:5000", env = "MT_TRACKER_LISTEN")]
    listen: SocketAddr,

    /// Path to the persisted registry document.
    #[arg(long, default_value = "tracker_db.json", env = "MT_TRACKER_DB")]
    db: PathBuf,

    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "info", env = "MT_TRACKER_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(InitLoggingOptions {
        default_rust_log_value: &opts.log_level,
    })?;

    let store = JsonStore::new(&opts.db);
    let registry = Arc::new(
        Registry::load(store)
            .await
            .with_context(|| format!("failed to load registry from {:?}", opts.db))?,
    );
    info!(db = ?opts.db, "tracker registry loaded");

    if let Err(e) = mt_tracker::serve(registry, opts.listen).await {
        error!("tracker server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
