use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "capturer",
    about = "Universal Capturer - Capture audio from Twitter Spaces and other live or on-demand streams",
    version,
    long_about = "A CLI tool for capturing audio streams from platforms like Twitter/X Spaces and direct HLS or media URLs. Drives ffmpeg as an external engine, reports progress while the capture runs, and always delivers whatever was captured before a failure or interruption."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Reduce diagnostic output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture audio from a URL
    Capture {
        /// URL to capture (Twitter/X Space, HLS playlist, or direct media URL)
        #[arg(value_name = "URL")]
        url: String,

        /// Directory the finished file is delivered to (current directory if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Audio bitrate used when the stream-copy attempt fails and the
        /// capture falls back to re-encoding
        #[arg(long, value_name = "BITRATE")]
        fallback_bitrate: Option<String>,
    },

    /// Show or manage configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}
