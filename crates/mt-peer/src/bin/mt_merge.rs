use std::path::PathBuf;

use clap::Parser;

/// Standalone chunk-merging utility (`spec.md` SS4.6): reassembles a file
/// from chunk files matched by a glob pattern, out-of-band from any running
/// peer process.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Opts {
    /// Pattern matching chunk files, e.g. "downloads/example.mp4.*"
    #[arg(long)]
    pattern: String,

    /// Path to write the merged output to.
    #[arg(long)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    mt_peer::merge::merge_glob(&opts.pattern, &opts.output)
}
