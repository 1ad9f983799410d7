//! `SharedFile` (`spec.md` SS3): everything a peer knows about a file it
//! currently offers to others, whether because it split and shared it
//! locally or because it finished downloading it. Guarded by a single
//! `parking_lot::Mutex` - critical sections here are map lookups/updates
//! only, never I/O, matching SS5's discipline for `shared_files`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use mt_core::FileId;

#[derive(Debug, Clone)]
pub struct SharedFile {
    pub filename: String,
    pub size: u64,
    pub chunks_total: u32,
    pub chunks_held: BTreeSet<u32>,
    /// Set once the whole file is available as a single file on disk (either
    /// the path a `share` came from, or the merge output of a completed
    /// download). When `None`, only the per-chunk files in `chunk_dir`
    /// exist.
    pub whole_file: Option<PathBuf>,
    /// Directory holding `<filename>.<i>` chunk files.
    pub chunk_dir: PathBuf,
}

impl SharedFile {
    pub fn is_complete(&self) -> bool {
        self.chunks_held.len() as u32 >= self.chunks_total
    }
}

#[derive(Default)]
pub struct SharedFiles {
    inner: parking_lot::Mutex<std::collections::HashMap<FileId, SharedFile>>,
}

impl SharedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, file_id: FileId, shared: SharedFile) {
        self.inner.lock().insert(file_id, shared);
    }

    pub fn remove(&self, file_id: &FileId) -> Option<SharedFile> {
        self.inner.lock().remove(file_id)
    }

    pub fn contains(&self, file_id: &FileId) -> bool {
        self.inner.lock().contains_key(file_id)
    }

    pub fn get_clone(&self, file_id: &FileId) -> Option<SharedFile> {
        self.inner.lock().get(file_id).cloned()
    }

    pub fn snapshot(&self) -> std::collections::HashMap<FileId, SharedFile> {
        self.inner.lock().clone()
    }
}
