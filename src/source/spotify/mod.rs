//! Spotify playlist source.
//!
//! - `dto` mirrors the Web API JSON
//! - `adapter` turns it into [`Item`](crate::model::Item)s
//! - `client` handles auth and paging

mod adapter;
mod client;
mod dto;

pub use client::SpotifyClient;

use super::SourceError;

const URL_PREFIXES: &[&str] = &[
    "https://open.spotify.com/playlist/",
    "http://open.spotify.com/playlist/",
    "open.spotify.com/playlist/",
    "spotify:playlist:",
];

/// Extract the playlist id from a share URL or `spotify:playlist:` URI.
///
/// Query strings (`?si=...`) and trailing slashes are ignored.
pub fn parse_playlist_id(reference: &str) -> Result<&str, SourceError> {
    let trimmed = reference.trim();
    let rest = URL_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .ok_or_else(|| SourceError::InvalidUrl(reference.to_string()))?;

    let id = rest
        .split(['?', '#', '/'])
        .next()
        .unwrap_or_default();

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SourceError::InvalidUrl(reference.to_string()));
    }
    Ok(id)
}
