//! Spotify Web API HTTP client
//!
//! Uses the client-credentials flow, which is enough for public playlists.
//! See: https://developer.spotify.com/documentation/web-api/tutorials/client-credentials-flow

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

use super::{adapter, dto, parse_playlist_id};
use crate::source::{Playlist, PlaylistSource, SourceError};

const DEFAULT_API_URL: &str = "https://api.spotify.com";
const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Refresh tokens this long before Spotify says they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_url: String,
    accounts_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    /// Create a client sharing an existing HTTP connection pool
    pub fn new(
        http_client: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(SourceError::MissingCredentials);
        }

        Ok(Self {
            http_client,
            client_id,
            client_secret,
            api_url: DEFAULT_API_URL.to_string(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Create a client for testing with custom base URLs
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http_client: reqwest::Client::new(),
            client_id: "test-id".to_string(),
            client_secret: "test-secret".to_string(),
            api_url: base_url.clone(),
            accounts_url: base_url,
            token: Mutex::new(None),
        }
    }

    /// Fetch a playlist's name and every track page.
    pub async fn playlist(&self, playlist_id: &str) -> Result<Playlist, SourceError> {
        let token = self.access_token().await?;

        let url = format!("{}/v1/playlists/{}", self.api_url, playlist_id);
        let first: dto::PlaylistResponse = self.get_json(&url, &token).await?;

        let mut entries = first.tracks.items;
        let mut next = first.tracks.next;
        while let Some(url) = next {
            let page: dto::TracksPage = self.get_json(&url, &token).await?;
            entries.extend(page.items);
            next = page.next;
        }

        let total = entries.len();
        let items = adapter::to_items(entries);
        tracing::info!(
            "Loaded playlist {:?}: {} tracks ({} skipped)",
            first.name,
            items.len(),
            total - items.len()
        );

        Ok(Playlist {
            name: first.name,
            items,
        })
    }

    /// Current bearer token, requesting a new one when missing or stale.
    async fn access_token(&self) -> Result<String, SourceError> {
        if let Some(cached) = self.token.lock().as_ref()
            && cached.expires_at > Instant::now()
        {
            return Ok(cached.value.clone());
        }

        let response = self
            .http_client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(error) = response.json::<dto::AuthError>().await {
                return Err(SourceError::Auth(
                    error.error_description.unwrap_or(error.error),
                ));
            }
            return Err(SourceError::Auth(format!("HTTP {}", status)));
        }

        let token: dto::TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        *self.token.lock() = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    /// Send an authorized GET and parse the response
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, SourceError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SourceError::Auth("access token rejected".to_string()));
        }

        if !status.is_success() {
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(SourceError::Network(error.error.message));
            }
            return Err(SourceError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn load(&self, reference: &str) -> Result<Playlist, SourceError> {
        let id = parse_playlist_id(reference)?;
        self.playlist(id).await
    }
}
