use std::time::Duration;

/// Fixed chunk size files are split into. The last chunk of a file may be shorter.
pub const CHUNK_SIZE: u64 = 1024 * 1024;

/// How often a peer re-announces every shared file to the tracker.
pub const ANNOUNCE_INTERVAL: Duration = Duration::from_secs(60);

/// A peer whose last announce for a file is older than this is considered dead
/// and is filtered out of `list`/`get_file` responses.
pub const PEER_LIVENESS_WINDOW: Duration = Duration::from_secs(300);

/// Timeout for a peer-to-peer chunk fetch.
pub const CHUNK_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before retrying a chunk whose scan found no peer holding it.
pub const CHUNK_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Sane default for peer -> tracker calls, which the spec leaves unspecified.
pub const TRACKER_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of chunks needed to hold `size` bytes at [`CHUNK_SIZE`] each.
pub fn chunk_count(size: u64) -> u32 {
    if size == 0 {
        return 1;
    }
    size.div_ceil(CHUNK_SIZE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_exact_multiple() {
        assert_eq!(chunk_count(CHUNK_SIZE), 1);
        assert_eq!(chunk_count(CHUNK_SIZE * 3), 3);
    }

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(chunk_count(CHUNK_SIZE + 1), 2);
        assert_eq!(chunk_count(CHUNK_SIZE * 2 + 1), 3);
        assert_eq!(chunk_count(2_097_153), 3);
    }

    #[test]
    fn chunk_count_zero_size_is_still_one_chunk() {
        assert_eq!(chunk_count(0), 1);
    }
}
