//! Durable storage for the tracker's registry: a single JSON document,
//! rewritten in full after every mutation (`spec.md` SS4.1). Grounded on the
//! teacher's `session_persistence/json.rs`: write to a temp file, then
//! rename over the real path, so a crash mid-write never leaves a torn
//! document - the last successful write is always a complete snapshot.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use mt_core::FileId;

use crate::registry::FileRecord;

pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the document, creating an empty one if the file doesn't exist
    /// yet (first run).
    pub async fn load(&self) -> anyhow::Result<IndexMap<FileId, FileRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IndexMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Serializes `doc` as pretty-printed JSON and atomically replaces the
    /// persisted file.
    pub async fn save(&self, doc: &IndexMap<FileId, FileRecord>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(doc)?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_missing_file_yields_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nonexistent.json"));
        let doc = store.load().await.unwrap();
        assert!(doc.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        use indexmap::indexmap;
        use std::collections::BTreeSet;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker_db.json");
        let store = JsonStore::new(&path);

        let doc = indexmap! {
            FileId::from_opaque("deadbeefdeadbeef") => FileRecord {
                filename: "hello.bin".to_string(),
                size: 2_097_153,
                created_at: 1000,
                chunks: 3,
                peers: indexmap! {
                    mt_core::PeerId::new("peerA") => crate::registry::PeerEntry {
                        ip: "127.0.0.1".to_string(),
                        port: 8001,
                        last_seen: 1000,
                        chunks: BTreeSet::from([0, 1]),
                    }
                },
            }
        };

        store.save(&doc).await.unwrap();
        assert!(path.exists());
        assert!(!tmp_path(&path).exists());

        let loaded = store.load().await.unwrap();
        let record = loaded.get(&FileId::from_opaque("deadbeefdeadbeef")).unwrap();
        assert_eq!(record.filename, "hello.bin");
        assert_eq!(record.chunks, 3);
    }
}
