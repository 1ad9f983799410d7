//! Periodic announcer (`spec.md` SS4.5): for every `SharedFile`, re-announce
//! its full chunk set to the tracker every [`ANNOUNCE_INTERVAL`]. The task
//! for a file terminates as soon as that file is no longer in
//! `shared_files` - there's no separate cancellation signal, removal *is*
//! the signal.

use std::sync::Arc;

use mt_core::constants::ANNOUNCE_INTERVAL;
use mt_core::proto::AnnounceRequest;
use mt_core::{FileId, PeerId};
use tracing::{debug, info, info_span, warn};

use crate::client::TrackerClient;
use crate::shared_files::SharedFiles;
use crate::task::spawn_logged;

#[derive(Clone)]
pub struct Announcer {
    pub peer_id: PeerId,
    pub port: u16,
    pub tracker: TrackerClient,
    pub shared_files: Arc<SharedFiles>,
}

impl Announcer {
    /// Spawns the background loop for `file_id`. Call once per `SharedFile`
    /// - once when it's first shared (via `share` or a completed download),
    /// never again for the same id.
    pub fn spawn_for(&self, file_id: FileId) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        spawn_logged(
            info_span!("announcer", file_id = %file_id),
            async move { this.run(file_id).await },
        )
    }

    async fn run(&self, file_id: FileId) {
        info!("starting periodic announcements");
        loop {
            let Some(shared) = self.shared_files.get_clone(&file_id) else {
                info!("stopping announcements: file no longer shared");
                return;
            };

            let req = AnnounceRequest {
                peer_id: self.peer_id.clone(),
                file_id: file_id.clone(),
                port: self.port,
                chunks: shared.chunks_held.into_iter().collect(),
                filename: None,
                size: None,
                chunks_total: None,
            };

            match self.tracker.announce(&req).await {
                Ok(()) => debug!("announced successfully"),
                Err(e) => warn!(error = %e, "announce failed, will retry next interval"),
            }

            tokio::time::sleep(ANNOUNCE_INTERVAL).await;
        }
    }
}
