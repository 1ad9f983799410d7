use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Opaque 16-character file identifier. Not content-addressed: re-sharing the
/// same file produces a new id. The tracker never validates or recomputes
/// one it receives over the wire - it's a bag of bytes used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Derives an id from `SHA-256(filename || "-" || size || "-" || now)`,
    /// truncated to the first 16 hex characters, matching the reference
    /// peer's `calculate_file_id` / tracker's `/generate_file_id`.
    pub fn generate(filename: &str, size: u64, now: SystemTime) -> Self {
        let secs = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let unique = format!("{filename}-{size}-{secs}");
        let digest = Sha256::digest(unique.as_bytes());
        let hex = hex::encode(digest);
        Self(hex[..16].to_string())
    }

    /// Wraps an arbitrary string as a `FileId` without validation, matching
    /// the tracker's opaque treatment of ids presented by peers.
    pub fn from_opaque(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

/// Opaque peer identifier, chosen by the peer itself (an 8-character UUID
/// prefix in the reference implementation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Generates a fresh peer id the way the reference peer does: the first
    /// 8 characters of a random UUID.
    pub fn generate() -> Self {
        let full = uuid::Uuid::new_v4().simple().to_string();
        Self(full[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_truncates_to_16_hex_chars() {
        let id = FileId::generate("hello.bin", 2_097_153, UNIX_EPOCH);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_is_not_content_addressed() {
        let t0 = UNIX_EPOCH;
        let t1 = UNIX_EPOCH + std::time::Duration::from_secs(1);
        let a = FileId::generate("hello.bin", 10, t0);
        let b = FileId::generate("hello.bin", 10, t1);
        assert_ne!(a, b);
    }

    #[test]
    fn from_opaque_roundtrips() {
        let id = FileId::from_opaque("abcdef0123456789");
        assert_eq!(id.as_str(), "abcdef0123456789");
    }
}
