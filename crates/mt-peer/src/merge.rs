//! Standalone merge collaborator (`spec.md` SS4.6): given a glob pattern and
//! an output path, sorts chunk files by the integer suffix after each
//! file's last `.` and concatenates them. Deliberately **not** used by the
//! downloader's completion path (`crate::downloader`), which does its own
//! in-memory merge from a known `total_chunks` instead of globbing.
//! Grounded on `original_source/merge.py::merge_file_chunks`.

use std::fs;
use std::path::{Path, PathBuf};

/// Merges every file matching `pattern` into `output_path`, in ascending
/// numeric order of the suffix after each match's last `.` (`foo.2` sorts
/// before `foo.10`, unlike a lexical sort).
pub fn merge_glob(pattern: &str, output_path: &Path) -> anyhow::Result<()> {
    let mut chunk_files = glob::glob(pattern)?.collect::<Result<Vec<PathBuf>, _>>()?;

    if chunk_files.is_empty() {
        anyhow::bail!("no chunk files found matching pattern '{pattern}'");
    }

    chunk_files.sort_by_key(|path| chunk_suffix(path));

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    println!(
        "Merging {} chunks into {}...",
        chunk_files.len(),
        output_path.display()
    );
    let mut out = fs::File::create(output_path)?;
    for chunk_file in &chunk_files {
        println!("Processing chunk: {}", chunk_file.display());
        let mut infile = fs::File::open(chunk_file)?;
        std::io::copy(&mut infile, &mut out)?;
    }
    println!("Successfully merged chunks into {}", output_path.display());
    Ok(())
}

/// The integer after a path's last `.`, or `i64::MAX` so a chunk file with
/// no numeric suffix sorts last rather than aborting the whole merge.
fn chunk_suffix(path: &Path) -> i64 {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.rsplit('.').next())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(i64::MAX)
}
