//! lyrics.ovh HTTP client
//!
//! The service matches on the exact artist string, so callers pass only the
//! first credited artist ("Daft Punk", not "Daft Punk, Pharrell Williams").

use super::dto;
use crate::enrichment::domain::ServiceError;

const DEFAULT_BASE_URL: &str = "https://api.lyrics.ovh";

/// lyrics.ovh API client
pub struct LyricsOvhClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl LyricsOvhClient {
    /// Create a client sharing an existing HTTP connection pool
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Look up plain lyrics for a track
    pub async fn lookup(&self, artist: &str, title: &str) -> Result<String, ServiceError> {
        let url = format!(
            "{}/v1/{}/{}",
            self.base_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited);
        }

        if !status.is_success() {
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(ServiceError::Api(error.error));
            }
            return Err(ServiceError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .json::<dto::LyricsResponse>()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        let lyrics = body.lyrics.replace("\r\n", "\n");
        if lyrics.trim().is_empty() {
            return Err(ServiceError::NotFound);
        }
        Ok(lyrics)
    }
}
