//! Batch sources: where the items of a run come from.
//!
//! - [`SpotifyClient`] - a Spotify playlist URL
//! - [`ManifestSource`] - a local JSON manifest
//!
//! Sources only describe tracks. The destination directory is chosen by the
//! caller via [`prepare_destination`] and stamped onto every item with
//! [`Playlist::into_items`] before dispatch.

pub mod manifest;
pub mod spotify;

pub use manifest::ManifestSource;
pub use spotify::SpotifyClient;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::model::Item;

/// Fallback directory name for playlists whose name sanitizes to nothing.
const DEFAULT_PLAYLIST_NAME: &str = "playlist";

/// A named, ordered batch of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub items: Vec<Item>,
}

impl Playlist {
    /// Items with their output directory set, in playlist order.
    pub fn into_items(self, target_dir: &Path) -> Vec<Item> {
        self.items
            .into_iter()
            .map(|item| Item {
                target_dir: target_dir.to_path_buf(),
                ..item
            })
            .collect()
    }
}

/// Errors loading a batch.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid playlist URL {0:?}. Expected format: https://open.spotify.com/playlist/...")]
    InvalidUrl(String),

    #[error("Spotify client id and secret are required")]
    MissingCredentials,

    #[error("Spotify authentication failed: {0}")]
    Auth(String),

    #[error("Playlist not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Failed to read manifest {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Loads a playlist from a reference (URL, file path).
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn load(&self, reference: &str) -> Result<Playlist, SourceError>;
}

/// Directory-safe playlist name.
///
/// Keeps alphanumerics, spaces, underscores and hyphens, trims trailing
/// whitespace, and falls back to `"playlist"`.
pub fn sanitize_playlist_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let trimmed = kept.trim_end();
    if trimmed.is_empty() {
        DEFAULT_PLAYLIST_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Create (if needed) and return `base/<sanitized playlist name>`.
pub fn prepare_destination(base: &Path, playlist_name: &str) -> std::io::Result<PathBuf> {
    let dir = base.join(sanitize_playlist_name(playlist_name));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
