//! Internal domain models for tag enrichment.
//!
//! These types are OUR types - they don't change when the lyric or artwork
//! services change. Service responses get converted into these types by the
//! clients before the tagger sees them.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Everything the tagger writes into one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pub title: String,
    /// Artists joined with ", "
    pub artist: String,
    pub album: String,
    /// Album artists joined with ", "
    pub album_artist: String,
    pub release_date: String,
    /// Unsynchronized lyrics, when the lookup succeeded
    pub lyrics: Option<LyricsText>,
}

/// Lyric text with the 3-letter language code it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsText {
    pub text: String,
    /// ISO 639-2 code, e.g. "eng"
    pub language: String,
}

/// Non-fatal problem during enrichment.
///
/// The file is still saved with its core tags when one of these occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum EnrichmentWarning {
    /// Cover art could not be fetched or embedded
    Artwork(String),
    /// Lyrics lookup, language detection or mapping failed
    Lyrics(String),
}

impl fmt::Display for EnrichmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentWarning::Artwork(msg) => write!(f, "artwork: {}", msg),
            EnrichmentWarning::Lyrics(msg) => write!(f, "lyrics: {}", msg),
        }
    }
}

/// Fatal enrichment failure. The pipeline maps this to `Failed(enrich)`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Failed to save tags to {path}: {message}")]
    Save { path: PathBuf, message: String },
}

/// Errors from the external lookup services (artwork, lyrics).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Not found")]
    NotFound,

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("API request failed: {0}")]
    Api(String),
}
