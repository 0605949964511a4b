//! Cover art HTTP client
//!
//! Downloads album artwork from the URL the batch source supplied
//! (for Spotify playlists, an i.scdn.co image). No API key required.

use crate::enrichment::domain::ServiceError;

/// Downloaded cover art
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    /// Image data (JPEG or PNG)
    pub data: Vec<u8>,
    /// MIME type (image/jpeg or image/png)
    pub mime_type: String,
    /// Source URL
    pub url: String,
}

impl CoverArt {
    /// Last path segment of the source URL, used as the picture description.
    pub fn description(&self) -> String {
        self.url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// Cover art download client
pub struct CoverArtClient {
    http_client: reqwest::Client,
}

impl CoverArtClient {
    /// Create a client sharing an existing HTTP connection pool
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Download an image from a URL
    pub async fn download(&self, url: &str) -> Result<CoverArt, ServiceError> {
        let response = self
            .http_client
            .get(url)
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
            return Err(ServiceError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        // Spotify serves JPEG; trust the header when there is one
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?
            .to_vec();

        if data.is_empty() {
            return Err(ServiceError::Parse("empty image body".to_string()));
        }

        Ok(CoverArt {
            data,
            mime_type,
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_description_is_last_segment() {
        let cover = CoverArt {
            data: vec![],
            mime_type: "image/jpeg".to_string(),
            url: "https://i.scdn.co/image/ab67616d0000b273".to_string(),
        };
        assert_eq!(cover.description(), "ab67616d0000b273");
    }

    #[tokio::test]
    async fn test_download_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/image/abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
            )
            .mount(&server)
            .await;

        let client = CoverArtClient::new(reqwest::Client::new());
        let url = format!("{}/image/abc", server.uri());
        let cover = client.download(&url).await.unwrap();

        assert_eq!(cover.mime_type, "image/png");
        assert_eq!(cover.data.len(), 4);
        assert_eq!(cover.url, url);
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = CoverArtClient::new(reqwest::Client::new());
        let result = client.download(&format!("{}/missing", server.uri())).await;
        assert_eq!(result, Err(ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_download_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = CoverArtClient::new(reqwest::Client::new());
        let result = client.download(&format!("{}/image", server.uri())).await;
        assert!(matches!(result, Err(ServiceError::Network(msg)) if msg.contains("503")));
    }
}
