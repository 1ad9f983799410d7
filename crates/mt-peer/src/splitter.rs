//! Splits a local file into fixed-size chunk files (`spec.md` SS4.3),
//! grounded on `original_source/peer1.py::split_file` /
//! `calculate_file_id`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use mt_core::{chunk_count, FileId, CHUNK_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Result of splitting a file: everything needed to register it with the
/// tracker and to serve it locally afterwards.
pub struct SplitFile {
    pub file_id: FileId,
    pub filename: String,
    pub size: u64,
    pub num_chunks: u32,
}

/// Splits `path` into `<basename>.<i>` chunk files under `upload_dir`.
/// Each chunk except possibly the last is exactly [`CHUNK_SIZE`] bytes.
pub async fn split_file(path: &Path, upload_dir: &Path) -> anyhow::Result<SplitFile> {
    let metadata = tokio::fs::metadata(path).await?;
    let size = metadata.len();
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("path {path:?} has no file name"))?
        .to_string();

    let num_chunks = chunk_count(size);
    tokio::fs::create_dir_all(upload_dir).await?;

    let mut src = tokio::fs::File::open(path).await?;
    let mut buf = vec![0u8; CHUNK_SIZE as usize];
    for i in 0..num_chunks {
        let n = read_up_to(&mut src, &mut buf).await?;
        let chunk_path = chunk_file_path(upload_dir, &filename, i);
        let mut out = tokio::fs::File::create(&chunk_path).await?;
        out.write_all(&buf[..n]).await?;
    }

    let file_id = FileId::generate(&filename, size, SystemTime::now());

    Ok(SplitFile {
        file_id,
        filename,
        size,
        num_chunks,
    })
}

/// Reads up to `buf.len()` bytes, short only at EOF - unlike a single
/// `read()`, which may return fewer bytes than requested even mid-stream.
async fn read_up_to(src: &mut tokio::fs::File, buf: &mut [u8]) -> anyhow::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = src.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

pub fn chunk_file_path(dir: &Path, filename: &str, chunk_index: u32) -> PathBuf {
    dir.join(format!("{filename}.{chunk_index}"))
}
