//! JSON manifest batch source.
//!
//! ```json
//! {
//!   "name": "Road Trip",
//!   "items": [
//!     { "title": "Africa", "artists": ["Toto"], "album": "Toto IV",
//!       "album_artists": ["Toto"], "release_date": "1982-04-08",
//!       "cover_art_url": "https://i.scdn.co/image/abc" }
//!   ]
//! }
//! ```
//!
//! Only `title` and `artists` are required per item.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

use super::{Playlist, PlaylistSource, SourceError};
use crate::model::Item;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    name: String,
    items: Vec<Item>,
}

/// Reads playlists from JSON files; the reference is the file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestSource;

impl ManifestSource {
    pub fn parse(json: &str) -> Result<Playlist, SourceError> {
        let manifest: Manifest =
            serde_json::from_str(json).map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(Playlist {
            name: manifest.name,
            items: manifest.items,
        })
    }
}

#[async_trait]
impl PlaylistSource for ManifestSource {
    async fn load(&self, reference: &str) -> Result<Playlist, SourceError> {
        let path = PathBuf::from(reference);
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SourceError::Io(path.clone(), e))?;
        let playlist = Self::parse(&json)?;
        tracing::info!(
            "Loaded {} items from manifest {:?}",
            playlist.items.len(),
            path
        );
        Ok(playlist)
    }
}
