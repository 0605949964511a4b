//! Spotify Web API response types.
//!
//! These match the JSON exactly; only the fields we read are declared.
//! See: https://developer.spotify.com/documentation/web-api/reference/get-playlist

use serde::Deserialize;

/// Client-credentials token response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    #[serde(default = "default_expiry")]
    pub expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}

/// `GET /v1/playlists/{id}`
#[derive(Debug, Deserialize)]
pub struct PlaylistResponse {
    pub name: String,
    pub tracks: TracksPage,
}

/// One page of playlist entries
#[derive(Debug, Deserialize)]
pub struct TracksPage {
    #[serde(default)]
    pub items: Vec<PlaylistEntry>,
    /// Absolute URL of the next page
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistEntry {
    /// Null for tracks that were removed from Spotify
    pub track: Option<Track>,
    #[serde(default)]
    pub is_local: bool,
}

#[derive(Debug, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    /// "track" or "episode"
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    pub url: String,
}

/// Web API error body: `{"error": {"status": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

/// Accounts service error body: `{"error": "invalid_client", "error_description": "..."}`
#[derive(Debug, Deserialize)]
pub struct AuthError {
    pub error: String,
    pub error_description: Option<String>,
}
