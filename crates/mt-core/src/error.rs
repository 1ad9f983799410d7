/// Error taxonomy shared between the tracker and peer libraries.
///
/// `PeerUnavailable` and `TrackerUnavailable` from the design's error model
/// are deliberately absent here: both are recovered locally by the caller
/// (try next peer, sleep-and-retry, log-and-continue-next-interval) and
/// never need to cross an API boundary as a typed value.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing or malformed announce fields")]
    BadRequest,

    #[error("file {0} is not registered")]
    UnknownFile(String),

    #[error("chunk {chunk_index} of file {file_id} is not available")]
    UnknownChunk { file_id: String, chunk_index: u32 },

    #[error("no active peers for file {0}")]
    NoPeers(String),

    #[error("chunk file missing while merging {filename}, chunk {chunk_index}")]
    MergeCorruption { filename: String, chunk_index: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
