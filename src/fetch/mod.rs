//! Content fetching: download a locator's audio into a final MP3.
//!
//! Fetch failures are classified so the retrier only repeats the ones that
//! can succeed on another try. The production fetcher lives in [`ytdlp`].

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::model::Locator;
use crate::pipeline::retry::Retryable;

/// Why a fetch attempt produced no file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Content exists but cannot be served (removed, private, blocked)
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The locator is malformed or unsupported
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Live streams and premieres have no finished audio
    #[error("Live content is not supported: {0}")]
    LiveContentUnsupported(String),

    /// yt-dlp or ffmpeg could not be started at all
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Anything that might work on another attempt
    #[error("Transient fetch error: {0}")]
    Transient(String),
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Downloads the content behind a locator.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Store the content as `dest_dir/desired_name.mp3` and return that path.
    ///
    /// Temporary files live in a directory private to this call and are
    /// removed on every exit path.
    async fn fetch(
        &self,
        locator: &Locator,
        dest_dir: &Path,
        desired_name: &str,
    ) -> Result<PathBuf, FetchError>;
}

/// Final path for a fetched item.
pub fn target_path(dest_dir: &Path, desired_name: &str) -> PathBuf {
    dest_dir.join(format!("{}.mp3", desired_name))
}

const LIVE_MARKERS: &[&str] = &[
    "live event will begin",
    "premieres in",
    "is currently live",
    "does not pass filter (!is_live)",
];

const INVALID_MARKERS: &[&str] = &[
    "is not a valid url",
    "unsupported url",
    "incomplete youtube id",
    "invalid url",
];

const UNAVAILABLE_MARKERS: &[&str] = &[
    "video unavailable",
    "private video",
    "has been removed",
    "is not available",
    "account associated with this video has been terminated",
    "sign in to confirm your age",
];

/// Classify a failed download from the tool's output.
///
/// Unrecognised output counts as transient.
pub fn classify_failure(output: &str) -> FetchError {
    let lower = output.to_lowercase();
    let message = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| line.starts_with("ERROR"))
        .or_else(|| output.lines().map(str::trim).rfind(|l| !l.is_empty()))
        .unwrap_or("no output")
        .to_string();

    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if has(LIVE_MARKERS) {
        FetchError::LiveContentUnsupported(message)
    } else if has(INVALID_MARKERS) {
        FetchError::InvalidReference(message)
    } else if has(UNAVAILABLE_MARKERS) {
        FetchError::SourceUnavailable(message)
    } else {
        FetchError::Transient(message)
    }
}

/// Mock fetchers for testing.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::test_utils::write_silent_mp3;

    /// Fetcher that writes a silent MP3 and records how many calls overlap.
    #[derive(Default)]
    pub struct MockFetcher {
        /// Remaining transient failures per desired name
        flaky: Mutex<HashMap<String, usize>>,
        /// Terminal errors per desired name
        broken: HashMap<String, FetchError>,
        /// Desired names whose fetch panics
        panics: Vec<String>,
        /// Time spent "downloading"
        delay: Duration,
        pub calls: AtomicUsize,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    /// Decrements the in-flight counter even when the fetch panics.
    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// `name` fails transiently `times` times before succeeding.
        pub fn flaky(self, name: &str, times: usize) -> Self {
            self.flaky.lock().insert(name.to_string(), times);
            self
        }

        /// `name` always fails with `error`.
        pub fn broken(mut self, name: &str, error: FetchError) -> Self {
            self.broken.insert(name.to_string(), error);
            self
        }

        /// Fetching `name` panics.
        pub fn panics_on(mut self, name: &str) -> Self {
            self.panics.push(name.to_string());
            self
        }
    }

    #[async_trait]
    impl ContentFetcher for MockFetcher {
        async fn fetch(
            &self,
            _locator: &Locator,
            dest_dir: &Path,
            desired_name: &str,
        ) -> Result<PathBuf, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if self.panics.iter().any(|n| n == desired_name) {
                panic!("fetcher blew up on {}", desired_name);
            }
            if let Some(err) = self.broken.get(desired_name) {
                return Err(err.clone());
            }
            if let Some(remaining) = self.flaky.lock().get_mut(desired_name)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(FetchError::Transient("HTTP Error 503".to_string()));
            }

            let path = target_path(dest_dir, desired_name);
            write_silent_mp3(&path);
            Ok(path)
        }
    }
}
