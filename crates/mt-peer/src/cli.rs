//! Peer startup flags plus the interactive shell (`spec.md` SS4.7/SS6):
//! `list`, `download`, `share`, `status`, `cancel`, `help`, `exit`. Grounded
//! on `original_source/peer1.py::cli()`'s blocking `input()` loop, which is
//! an external interface per SS6, not an implementation detail we're free
//! to drop - ported onto a `tokio::io::stdin` read loop instead of a
//! blocking thread so it shares the runtime with the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use mt_core::FileId;
use tokio::io::AsyncBufReadExt;

use crate::Peer;

#[derive(Parser, Debug)]
#[command(version, about = "Mini-torrent peer: chunk server, downloader, and CLI shell")]
pub struct Opts {
    /// Port this peer listens for chunk requests and /status on.
    #[arg(long, default_value_t = 8001, env = "MT_PEER_PORT")]
    pub port: u16,

    /// Base URL of the tracker to announce to and query.
    #[arg(long, default_value = "http://localhost:5000", env = "MT_PEER_TRACKER")]
    pub tracker: String,

    /// Directory split chunk files are written to when sharing a file.
    #[arg(long, default_value = "uploads", env = "MT_PEER_UPLOAD_DIR")]
    pub upload_dir: PathBuf,

    /// Directory downloaded chunk files and reassembled files land in.
    #[arg(long, default_value = "downloads", env = "MT_PEER_DOWNLOAD_DIR")]
    pub download_dir: PathBuf,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info", env = "MT_PEER_LOG_LEVEL")]
    pub log_level: String,
}

impl Opts {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

pub fn print_help() {
    println!(
        "\n--- Mini-Torrent Peer Client ---\n\
         Commands:\n\
         \x20 list              - List available files from tracker\n\
         \x20 download [id]     - Download a file by ID\n\
         \x20 share [path]      - Share a file from local storage\n\
         \x20 status            - Show status of downloads and shared files\n\
         \x20 cancel [id]       - Cancel an active download\n\
         \x20 help              - Show this help message\n\
         \x20 exit              - Exit the client"
    );
}

/// Runs the interactive shell on stdin until `exit` or EOF.
pub async fn run_shell(peer: &Peer) {
    print_help();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        if std::io::Write::flush(&mut std::io::stdout()).is_err() {
            break;
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error reading command: {e}");
                break;
            }
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(cmd) = words.first().copied() else {
            continue;
        };

        match cmd {
            "exit" => break,
            "help" => print_help(),
            "list" => handle_list(peer).await,
            "download" => handle_download(peer, words.get(1).copied()).await,
            "share" => handle_share(peer, words.get(1).copied()).await,
            "status" => handle_status(peer).await,
            "cancel" => handle_cancel(peer, words.get(1).copied()),
            other => {
                println!("Unknown command: {other}");
                print_help();
            }
        }
    }
    println!("Exiting peer client");
}

async fn handle_list(peer: &Peer) {
    match peer.tracker.list().await {
        Ok(resp) => {
            if resp.files.is_empty() {
                println!("No files available");
                return;
            }
            println!("\nAvailable files:");
            println!("{}", "-".repeat(60));
            println!("{:<18} {:<30} {:<10} {}", "ID", "Filename", "Size", "Peers");
            println!("{}", "-".repeat(60));
            for (file_id, info) in &resp.files {
                let size_str = format!("{:.2} MB", info.size as f64 / (1024.0 * 1024.0));
                println!(
                    "{:<18} {:<30} {:<10} {}",
                    file_id, info.filename, size_str, info.active_peers
                );
            }
        }
        Err(e) => println!("Error connecting to tracker: {e}"),
    }
}

async fn handle_download(peer: &Peer, file_id: Option<&str>) {
    let Some(file_id) = file_id else {
        println!("Usage: download [file_id]");
        return;
    };

    match peer.downloader.start(FileId::from_opaque(file_id)).await {
        Ok(started) => println!(
            "Started downloading {} ({} chunks)",
            started.filename, started.total_chunks
        ),
        Err(e) => println!("Error: {e}"),
    }
}

async fn handle_share(peer: &Peer, path: Option<&str>) {
    let Some(path) = path else {
        println!("Usage: share [filepath]");
        return;
    };

    match peer.share(std::path::Path::new(path)).await {
        Ok(split) => {
            println!("Sharing file: file {} is now being shared", split.filename);
            println!("File ID: {}", split.file_id);
        }
        Err(e) => println!("Error: {e}"),
    }
}

async fn handle_status(peer: &Peer) {
    println!("\nShared Files:");
    let shared = peer.shared_files.snapshot();
    if shared.is_empty() {
        println!("  No files being shared");
    } else {
        for (file_id, s) in &shared {
            println!("  {} (ID: {file_id})", s.filename);
        }
    }

    println!("\nActive Downloads:");
    let downloads = peer.downloads.snapshot();
    if downloads.is_empty() {
        println!("  No active downloads");
    } else {
        for d in downloads.values() {
            let pct = d.downloaded_chunks as f64 / d.total_chunks as f64 * 100.0;
            println!(
                "  {} - {pct:.1}% ({}/{} chunks)",
                d.filename, d.downloaded_chunks, d.total_chunks
            );
        }
    }
}

fn handle_cancel(peer: &Peer, file_id: Option<&str>) {
    let Some(file_id) = file_id else {
        println!("Usage: cancel [file_id]");
        return;
    };

    if peer.downloads.cancel(&FileId::from_opaque(file_id)) {
        println!("Download cancelled");
    } else {
        println!("Error: Download not found");
    }
}
