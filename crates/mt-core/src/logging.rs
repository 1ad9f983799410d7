//! Logging setup shared by `trackerd` and `peerd`. Simplified from the
//! teacher's `tracing_subscriber_config_utils.rs`: no runtime-reloadable
//! filter and no broadcast channel for a web UI log tail, since neither
//! binary in this design exposes a log-streaming endpoint.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub struct InitLoggingOptions<'a> {
    /// Used when `RUST_LOG` is unset.
    pub default_rust_log_value: &'a str,
}

pub fn init_logging(opts: InitLoggingOptions) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            opts.default_rust_log_value
                .parse()
                .context("invalid default RUST_LOG directive")?,
        )
        .from_env()
        .context("invalid RUST_LOG value")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))
}
