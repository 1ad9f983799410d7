pub mod constants;
pub mod error;
pub mod ids;
pub mod logging;
pub mod proto;

pub use constants::{chunk_count, CHUNK_SIZE};
pub use error::{Error, Result};
pub use ids::{FileId, PeerId};
