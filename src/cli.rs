use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trackprobe")]
#[command(author, version, about = "Read track metadata from Matroska and MP4 files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the tracks of a local file or HTTP(S) URL
    Tracks {
        /// File path or URL
        #[arg(required = true)]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Fail after reading more than this many bytes
        #[arg(long)]
        max_bytes: Option<u64>,

        /// Bytes requested per read
        #[arg(long)]
        chunk_size: Option<u64>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
