//! yt-dlp + ffmpeg fetcher.
//!
//! One attempt:
//! 1. Create a scratch directory inside the destination (unique per attempt)
//! 2. `yt-dlp -f bestaudio` the locator into it
//! 3. `ffmpeg` transcode to MP3 inside the scratch directory
//! 4. Rename the MP3 into place
//!
//! The scratch directory is a [`tempfile::TempDir`], so it is removed when the
//! attempt returns, whatever the result.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::{ContentFetcher, FetchError, classify_failure, target_path};
use crate::model::Locator;

/// Production fetcher shelling out to yt-dlp and ffmpeg.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    yt_dlp: PathBuf,
    ffmpeg: PathBuf,
    /// LAME VBR quality, 0 (best) to 9
    quality: u8,
}

impl YtDlpFetcher {
    pub fn new(yt_dlp: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            yt_dlp: yt_dlp.into(),
            ffmpeg: ffmpeg.into(),
            quality: quality.min(9),
        }
    }

    async fn download(&self, locator: &Locator, scratch: &Path) -> Result<PathBuf, FetchError> {
        let output = Command::new(&self.yt_dlp)
            .args(["-f", "bestaudio/best"])
            .arg("--no-playlist")
            .arg("--no-progress")
            .args(["--match-filter", "!is_live"])
            .arg("-o")
            .arg(scratch.join("source.%(ext)s"))
            .arg(locator.as_str())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error("yt-dlp", e))?;

        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }

        match find_download(scratch).await? {
            Some(path) => Ok(path),
            // yt-dlp exits 0 when a filter skips the video
            None => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                Err(classify_failure(&combined))
            }
        }
    }

    async fn transcode(&self, source: &Path, mp3: &Path) -> Result<(), FetchError> {
        let output = Command::new(&self.ffmpeg)
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(source)
            .arg("-vn")
            .args(["-codec:a", "libmp3lame"])
            .args(["-q:a", &self.quality.to_string()])
            .arg(mp3)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error("ffmpeg", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Transient(format!(
                "ffmpeg failed: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// A missing or non-executable tool will not appear between attempts.
fn spawn_error(tool: &str, e: std::io::Error) -> FetchError {
    let message = format!("Failed to run {}: {}", tool, e);
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => FetchError::ToolUnavailable(message),
        _ => FetchError::Transient(message),
    }
}

/// The file yt-dlp left in the scratch directory, ignoring partials.
async fn find_download(scratch: &Path) -> Result<Option<PathBuf>, FetchError> {
    let mut entries = tokio::fs::read_dir(scratch)
        .await
        .map_err(|e| FetchError::Transient(format!("Failed to list scratch directory: {}", e)))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FetchError::Transient(format!("Failed to list scratch directory: {}", e)))?
    {
        let path = entry.path();
        let is_partial = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "part" | "ytdl" | "tmp"));
        if path.is_file() && !is_partial {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[async_trait]
impl ContentFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        locator: &Locator,
        dest_dir: &Path,
        desired_name: &str,
    ) -> Result<PathBuf, FetchError> {
        let scratch = tempfile::Builder::new()
            .prefix(".fetch-")
            .tempdir_in(dest_dir)
            .map_err(|e| {
                FetchError::Transient(format!(
                    "Failed to create scratch directory in {:?}: {}",
                    dest_dir, e
                ))
            })?;

        tracing::debug!("Downloading {} into {:?}", locator, scratch.path());
        let source = self.download(locator, scratch.path()).await?;

        let converted = scratch.path().join("converted.mp3");
        self.transcode(&source, &converted).await?;

        let target = target_path(dest_dir, desired_name);
        tokio::fs::rename(&converted, &target).await.map_err(|e| {
            FetchError::Transient(format!("Failed to move MP3 to {:?}: {}", target, e))
        })?;

        Ok(target)
    }
}
