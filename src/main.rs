//! tune-harvest - download playlists as tagged MP3 files.
//!
//! Each playlist track is searched with yt-dlp, downloaded and transcoded
//! to MP3, then tagged with its metadata, cover art and lyrics. Tracks run
//! concurrently on a bounded worker pool and every run ends with a report
//! of what succeeded and what failed where.

pub mod cli;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod relocate;
pub mod resolve;
pub mod source;
#[cfg(test)]
pub mod test_utils;
pub mod tools;

use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let config = match &args.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.logging.log_file.clone());
    init_logging(log_file.as_deref())?;

    cli::run_command(&args, &config)
}

/// Log to stderr, and to `log_file` (truncated) when given
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| anyhow::anyhow!("Failed to create log file {:?}: {}", path, e))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tune_harvest=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}
