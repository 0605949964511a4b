//! Trait definitions for the enrichment collaborators.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.
//!
//! # Example
//!
//! ```ignore
//! use tune_harvest::enrichment::traits::LyricsApi;
//!
//! // In production code:
//! async fn process<T: LyricsApi>(client: &T) {
//!     let text = client.lyrics("Queen", "Bohemian Rhapsody").await?;
//! }
//!
//! // In tests:
//! struct MockLyrics { ... }
//! impl LyricsApi for MockLyrics { ... }
//! ```

use async_trait::async_trait;
use std::path::Path;

use super::coverart::CoverArt;
use super::domain::{EnrichmentError, EnrichmentWarning, ServiceError};
use crate::model::Item;

/// Trait for cover art download.
#[async_trait]
pub trait CoverArtApi: Send + Sync {
    /// Download the image at `url`.
    async fn fetch(&self, url: &str) -> Result<CoverArt, ServiceError>;
}

/// Trait for plain lyric lookup.
#[async_trait]
pub trait LyricsApi: Send + Sync {
    /// Look up lyrics for one artist and title.
    async fn lyrics(&self, artist: &str, title: &str) -> Result<String, ServiceError>;
}

/// Detects the natural language of a text as an ISO 639-1 code.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<String>;
}

/// Maps a 2-letter language code to the 3-letter code used in tags.
pub trait LanguageTable: Send + Sync {
    fn to_three_letter(&self, code: &str) -> Option<String>;
}

/// Writes an item's metadata into a downloaded file.
///
/// `Ok` carries the non-fatal warnings; `Err` means nothing usable was saved.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        path: &Path,
        item: &Item,
    ) -> Result<Vec<EnrichmentWarning>, EnrichmentError>;
}

// Implement traits for real clients

#[async_trait]
impl CoverArtApi for super::coverart::CoverArtClient {
    async fn fetch(&self, url: &str) -> Result<CoverArt, ServiceError> {
        self.download(url).await
    }
}

#[async_trait]
impl LyricsApi for super::lyrics::LyricsOvhClient {
    async fn lyrics(&self, artist: &str, title: &str) -> Result<String, ServiceError> {
        self.lookup(artist, title).await
    }
}

/// Mock collaborators for testing.
///
/// Return configurable responses for testing different scenarios.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock cover art source.
    pub struct MockCoverArt {
        /// Error to return
        pub error: Option<ServiceError>,
        /// Image bytes to return otherwise
        pub data: Vec<u8>,
        pub calls: AtomicUsize,
    }

    impl MockCoverArt {
        /// Create a mock that returns a small JPEG-looking payload.
        pub fn with_placeholder() -> Self {
            Self::with_data(vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0, 1])
        }

        pub fn with_data(data: Vec<u8>) -> Self {
            Self {
                error: None,
                data,
                calls: AtomicUsize::new(0),
            }
        }

        /// Create a mock that returns an error.
        pub fn with_error(error: ServiceError) -> Self {
            Self {
                error: Some(error),
                data: vec![],
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CoverArtApi for MockCoverArt {
        async fn fetch(&self, url: &str) -> Result<CoverArt, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ref err) = self.error {
                return Err(err.clone());
            }
            Ok(CoverArt {
                data: self.data.clone(),
                mime_type: "image/jpeg".to_string(),
                url: url.to_string(),
            })
        }
    }

    /// Mock lyric provider that records which artist it was asked for.
    pub struct MockLyrics {
        pub result: Result<String, ServiceError>,
        pub requests: Mutex<Vec<(String, String)>>,
    }

    impl MockLyrics {
        pub fn with_text(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn not_found() -> Self {
            Self::with_error(ServiceError::NotFound)
        }

        pub fn with_error(error: ServiceError) -> Self {
            Self {
                result: Err(error),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LyricsApi for MockLyrics {
        async fn lyrics(&self, artist: &str, title: &str) -> Result<String, ServiceError> {
            self.requests
                .lock()
                .push((artist.to_string(), title.to_string()));
            self.result.clone()
        }
    }

    /// Detector that always answers with a fixed code.
    pub struct FixedDetector(pub Option<&'static str>);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, _text: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    /// Enricher that touches nothing and records which files it saw.
    #[derive(Default)]
    pub struct MockEnricher {
        /// Warnings returned for every file
        pub warnings: Vec<EnrichmentWarning>,
        /// File stems whose save fails
        pub failing: Vec<String>,
        pub seen: Mutex<Vec<std::path::PathBuf>>,
    }

    impl MockEnricher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(mut self, stem: &str) -> Self {
            self.failing.push(stem.to_string());
            self
        }

        pub fn with_warning(mut self, warning: EnrichmentWarning) -> Self {
            self.warnings.push(warning);
            self
        }
    }

    #[async_trait]
    impl Enricher for MockEnricher {
        async fn enrich(
            &self,
            path: &Path,
            _item: &Item,
        ) -> Result<Vec<EnrichmentWarning>, EnrichmentError> {
            self.seen.lock().push(path.to_path_buf());
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if self.failing.iter().any(|f| f == stem) {
                return Err(EnrichmentError::Save {
                    path: path.to_path_buf(),
                    message: "disk full".to_string(),
                });
            }
            Ok(self.warnings.clone())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_enricher_failure() {
            let mock = MockEnricher::new().failing_on("Bad");
            let item = crate::test_utils::mock_item("Bad");
            assert!(mock.enrich(Path::new("/x/Good.mp3"), &item).await.is_ok());
            assert!(mock.enrich(Path::new("/x/Bad.mp3"), &item).await.is_err());
            assert_eq!(mock.seen.lock().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_coverart() {
            let mock = MockCoverArt::with_placeholder();
            let result = mock.fetch("https://img.example.com/abc").await.unwrap();
            assert!(result.url.contains("abc"));
            assert!(!result.data.is_empty());
            assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_mock_lyrics_records_requests() {
            let mock = MockLyrics::with_text("la la la");
            let text = mock.lyrics("Artist", "Song").await.unwrap();
            assert_eq!(text, "la la la");
            assert_eq!(
                mock.requests.lock().as_slice(),
                &[("Artist".to_string(), "Song".to_string())]
            );
        }

        #[tokio::test]
        async fn test_mock_lyrics_error() {
            let mock = MockLyrics::with_error(ServiceError::Network("timeout".to_string()));
            let result = mock.lyrics("A", "B").await;
            assert!(matches!(result, Err(ServiceError::Network(_))));
        }
    }
}
