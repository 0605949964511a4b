//! lyrics.ovh API Data Transfer Objects
//!
//! These types match EXACTLY what the lyrics.ovh API returns.
//! DO NOT use these types outside the lyrics module.
//!
//! API Reference: https://lyricsovh.docs.apiary.io

use serde::{Deserialize, Serialize};

/// Successful lookup: `GET /v1/{artist}/{title}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LyricsResponse {
    /// Lyric text, lines separated by `\n` (sometimes `\r\n`)
    pub lyrics: String,
}

/// Error body, returned with HTTP 404 when no lyrics are known
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
}
