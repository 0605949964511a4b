//! Playlist download command.

use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::enrichment::EnrichOptions;
use crate::error::{self, ResultExt};
use crate::fetch::YtDlpFetcher;
use crate::model::{BatchReport, Outcome};
use crate::pipeline::{ItemPipeline, RetryPolicy, WorkerPool};
use crate::relocate::relocate_dir;
use crate::resolve::YtDlpResolver;
use crate::source::{ManifestSource, PlaylistSource, SpotifyClient, prepare_destination};
use crate::tools::Toolchain;

use super::{build_enricher, http_client, print_tool_install_instructions};

/// Arguments for `download`
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Spotify playlist URLs
    #[arg(required_unless_present = "manifest")]
    pub playlists: Vec<String>,

    /// Read items from a JSON manifest instead of Spotify
    #[arg(long, conflicts_with = "playlists")]
    pub manifest: Option<PathBuf>,

    /// Base directory for playlist folders
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Items processed at once
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Attempts per stage
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Seconds between attempts
    #[arg(long)]
    pub delay_secs: Option<u64>,

    /// Skip items whose file already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Write the batch reports as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Move each finished playlist folder under this directory
    #[arg(long)]
    pub move_to: Option<PathBuf>,

    /// Don't look up lyrics
    #[arg(long)]
    pub no_lyrics: bool,

    /// Don't embed cover art
    #[arg(long)]
    pub no_artwork: bool,

    /// Spotify client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Spotify client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

/// Config file values with command-line overrides applied
#[derive(Debug, Clone, PartialEq)]
struct RunSettings {
    output_dir: PathBuf,
    concurrency: usize,
    retry: RetryPolicy,
    skip_existing: bool,
    enrich: EnrichOptions,
    audio_quality: u8,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl RunSettings {
    fn resolve(config: &Config, args: &DownloadArgs) -> Self {
        let download = &config.download;
        Self {
            output_dir: args
                .output
                .clone()
                .or_else(|| download.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            concurrency: args.concurrency.unwrap_or(download.concurrency),
            retry: RetryPolicy::new(
                args.attempts.unwrap_or(download.retry_attempts),
                Duration::from_secs(args.delay_secs.unwrap_or(download.retry_delay_secs)),
            ),
            skip_existing: args.skip_existing,
            enrich: EnrichOptions {
                embed_artwork: config.enrichment.embed_artwork && !args.no_artwork,
                fetch_lyrics: config.enrichment.fetch_lyrics && !args.no_lyrics,
            },
            audio_quality: download.audio_quality,
            client_id: args
                .client_id
                .clone()
                .or_else(|| config.credentials.spotify_client_id.clone()),
            client_secret: args
                .client_secret
                .clone()
                .or_else(|| config.credentials.spotify_client_secret.clone()),
        }
    }
}

/// One playlist's entry in the `--report` file
#[derive(Debug, Serialize)]
struct PlaylistReport {
    playlist: String,
    directory: PathBuf,
    report: BatchReport,
}

/// Download every requested playlist
pub fn cmd_download(rt: &Runtime, config: &Config, args: &DownloadArgs) -> anyhow::Result<()> {
    let settings = RunSettings::resolve(config, args);

    let toolchain = match Toolchain::discover(
        config.tools.yt_dlp.as_deref(),
        config.tools.ffmpeg.as_deref(),
    ) {
        Ok(toolchain) => toolchain,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_tool_install_instructions();
            return Err(error::Error::from(e).into());
        }
    };

    rt.block_on(async {
        let http = http_client()?;

        let (source, references): (Box<dyn PlaylistSource>, Vec<String>) = match &args.manifest {
            Some(path) => (
                Box::new(ManifestSource),
                vec![path.to_string_lossy().into_owned()],
            ),
            None => {
                let client = SpotifyClient::new(
                    http.clone(),
                    settings.client_id.clone().unwrap_or_default(),
                    settings.client_secret.clone().unwrap_or_default(),
                )
                .with_context("set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET or add them to the config file")?;
                (Box::new(client), args.playlists.clone())
            }
        };

        let pipeline = ItemPipeline::new(
            Arc::new(YtDlpResolver::new(&toolchain.yt_dlp)),
            Arc::new(YtDlpFetcher::new(
                &toolchain.yt_dlp,
                &toolchain.ffmpeg,
                settings.audio_quality,
            )),
            Arc::new(build_enricher(&http, settings.enrich)),
        )
        .with_retry(settings.retry)
        .with_skip_existing(settings.skip_existing);
        let pool = WorkerPool::new(pipeline, settings.concurrency);

        let abort = pool.abort_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing items already in progress");
                abort.cancel();
            }
        });

        let mut reports = Vec::new();
        for reference in &references {
            if pool.abort_handle().is_cancelled() {
                break;
            }

            let playlist = source
                .load(reference)
                .await
                .with_context(format!("Failed to load {}", reference))?;
            let name = playlist.name.clone();
            let directory = prepare_destination(&settings.output_dir, &name)
                .with_context(format!("Failed to create folder for {:?}", name))?;

            println!("Downloading {:?} into {:?}", name, directory);
            let report = pool.run_batch(playlist.into_items(&directory)).await;
            print_summary(&name, &report);

            let directory = match &args.move_to {
                Some(dest) => relocate(&directory, dest),
                None => directory,
            };

            reports.push(PlaylistReport {
                playlist: name,
                directory,
                report,
            });
        }

        if let Some(path) = &args.report {
            write_report(path, &reports)?;
            println!("Report written to {:?}", path);
        }

        Ok::<_, anyhow::Error>(())
    })
}

/// Move a finished playlist; failure leaves it where it is.
fn relocate(directory: &Path, dest: &Path) -> PathBuf {
    match relocate_dir(directory, dest) {
        Ok(moved) => {
            println!("Moved to {:?}", moved);
            moved
        }
        Err(e) => {
            let e = error::Error::from(e);
            tracing::error!("Could not move {:?}: {}", directory, e);
            eprintln!("✗ Could not move {:?}: {}", directory, e);
            directory.to_path_buf()
        }
    }
}

fn write_report(path: &Path, reports: &[PlaylistReport]) -> error::Result<()> {
    let json = serde_json::to_string_pretty(reports)
        .map_err(|e| error::Error::Io(std::io::Error::other(e)))?;
    std::fs::write(path, json).with_context(format!("Failed to write report {:?}", path))
}

fn print_summary(playlist: &str, report: &BatchReport) {
    println!();
    for line in summary_lines(playlist, report) {
        println!("{}", line);
    }
    println!();
}

fn summary_lines(playlist: &str, report: &BatchReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {} of {} downloaded, {} skipped, {} failed ({})",
        playlist,
        report.succeeded_count(),
        report.total(),
        report.skipped_count(),
        report.failed_count(),
        format_elapsed(report.elapsed()),
    )];

    for entry in &report.outcomes {
        if let Outcome::Succeeded { warnings, .. } = &entry.outcome {
            for warning in warnings {
                lines.push(format!("  ! {}: {}", entry.item, warning));
            }
        }
    }
    for failure in report.failures() {
        lines.push(format!(
            "  ✗ {} [{}]: {}",
            failure.item, failure.stage, failure.reason
        ));
    }
    lines
}

fn format_elapsed(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {:02}s", m, s),
        (h, m, s) => format!("{}h {:02}m {:02}s", h, m, s),
    }
}
