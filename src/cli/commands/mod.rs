//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `download`: Run playlists through the worker pool
//! - `tag`: Enrich a single existing file
//! - `tools`: Tool checks and config bootstrap

mod download;
mod tag;
mod tools;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::enrichment::{
    CoverArtClient, EnrichOptions, Iso639Table, LyricsOvhClient, TagEnricher, WhatlangDetector,
};

pub use download::{DownloadArgs, cmd_download};
pub use tag::{TagArgs, cmd_tag};
pub use tools::{cmd_check_tools, cmd_init_config};

/// Download playlists as tagged MP3 files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file (truncated at startup)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Download one or more playlists
    Download(DownloadArgs),
    /// Embed metadata, artwork and lyrics into an existing MP3
    Tag(TagArgs),
    /// Check that yt-dlp, ffmpeg and credentials are available
    CheckTools,
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Download(args) => {
            let rt = Runtime::new()?;
            cmd_download(&rt, config, args)
        }
        Commands::Tag(args) => {
            let rt = Runtime::new()?;
            cmd_tag(&rt, config, args)
        }
        Commands::CheckTools => cmd_check_tools(config),
        Commands::InitConfig { force } => cmd_init_config(cli.config.as_deref(), *force),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// HTTP client shared by every service client in a run
pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// Production enricher wired to the real artwork and lyric services
pub(crate) fn build_enricher(http: &reqwest::Client, options: EnrichOptions) -> TagEnricher {
    TagEnricher::new(
        Arc::new(CoverArtClient::new(http.clone())),
        Arc::new(LyricsOvhClient::new(http.clone())),
        Arc::new(WhatlangDetector),
        Arc::new(Iso639Table),
        options,
    )
}

/// Print installation instructions for the download tools
pub(crate) fn print_tool_install_instructions() {
    eprintln!("Install yt-dlp and ffmpeg:");
    eprintln!("  Windows: winget install yt-dlp.yt-dlp Gyan.FFmpeg");
    eprintln!("  macOS:   brew install yt-dlp ffmpeg");
    eprintln!("  Linux:   pipx install yt-dlp && apt install ffmpeg");
}
