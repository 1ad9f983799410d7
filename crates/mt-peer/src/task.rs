//! Background task spawning, adapted from the teacher's
//! `librqbit_core::spawn_utils`: wraps a future in its tracing span and
//! logs completion/failure so a crashed announcer or downloader worker
//! doesn't disappear silently.

use tracing::{Instrument, Span};

#[track_caller]
pub fn spawn_logged(
    span: Span,
    fut: impl std::future::Future<Output = ()> + Send + 'static,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(
        async move {
            tracing::trace!("started");
            fut.await;
            tracing::trace!("finished");
        }
        .instrument(span),
    )
}
