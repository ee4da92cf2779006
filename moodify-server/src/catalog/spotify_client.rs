//! Spotify Web API client
//!
//! Client-credentials token flow plus the recommendations and search
//! endpoints. Every call first resolves a bearer token through the
//! [`TokenCache`], then issues exactly one catalog request.

use async_trait::async_trait;
use moodify_common::config::CatalogConfig;
use moodify_common::time::Clock;
use moodify_common::Track;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::rules::recommendation_params;
use super::token_cache::{IssuedToken, TokenCache};
use super::{CatalogError, MusicCatalog, RecommendationRequest};

const USER_AGENT: &str = concat!("Moodify/", env!("CARGO_PKG_VERSION"));

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    tracks: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    album: SpotifyAlbum,
    preview_url: Option<String>,
    #[serde(default)]
    external_urls: ExternalUrls,
    popularity: Option<u8>,
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    name: String,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl From<SpotifyTrack> for Track {
    fn from(t: SpotifyTrack) -> Self {
        let spotify_url = t
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", t.id));
        Track {
            artist: t
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album: t.album.name,
            // First image is the largest
            image_url: t.album.images.into_iter().next().map(|i| i.url),
            preview_url: t.preview_url,
            popularity: t.popularity,
            duration: t.duration_ms,
            spotify_url,
            id: t.id,
            name: t.name,
        }
    }
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    config: CatalogConfig,
    tokens: TokenCache,
}

impl SpotifyClient {
    pub fn new(config: CatalogConfig, clock: Arc<dyn Clock>) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CatalogError::ServiceUnavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            tokens: TokenCache::new(clock),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.config.has_credentials()
    }

    async fn access_token(&self) -> Result<String, CatalogError> {
        self.tokens.refresh_if_expired(|| self.fetch_token()).await
    }

    /// Client-credentials grant against the token endpoint
    async fn fetch_token(&self) -> Result<IssuedToken, CatalogError> {
        let (client_id, client_secret) = match (&self.config.client_id, &self.config.client_secret) {
            (Some(id), Some(secret)) if self.config.has_credentials() => (id, secret),
            _ => {
                return Err(CatalogError::Authentication(
                    "Music catalog client credentials are not configured".to_string(),
                ))
            }
        };

        debug!(url = %self.config.token_url, "Requesting catalog access token");

        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::Authentication(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token endpoint rejected credentials");
            return Err(CatalogError::Authentication(format!(
                "Token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Authentication(format!("Invalid token response: {}", e)))?;

        info!(expires_in = token.expires_in, "Obtained catalog access token");
        Ok(IssuedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }

    /// Authenticated GET returning a parsed JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, CatalogError> {
        let token = self.access_token().await?;
        let url = format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::ServiceUnavailable("Catalog request timed out".to_string())
                } else {
                    CatalogError::ServiceUnavailable(format!("Catalog request failed: {}", e))
                }
            })?;

        let status = response.status();
        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                self.tokens.invalidate().await;
                return Err(CatalogError::Authentication(
                    "Catalog rejected the access token".to_string(),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(path, "Catalog rate limit hit");
                return Err(CatalogError::ServiceUnavailable(
                    "Catalog rate limit exceeded".to_string(),
                ));
            }
            other => {
                warn!(path, status = other.as_u16(), "Catalog request failed");
                return Err(CatalogError::ServiceUnavailable(format!(
                    "Catalog returned {}",
                    other.as_u16()
                )));
            }
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ServiceUnavailable(format!("Invalid catalog response: {}", e)))
    }

    fn with_market(&self, mut params: Vec<(String, String)>) -> Vec<(String, String)> {
        if let Some(market) = &self.config.market {
            params.push(("market".to_string(), market.clone()));
        }
        params
    }
}

#[async_trait]
impl MusicCatalog for SpotifyClient {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Vec<Track>, CatalogError> {
        let params = self.with_market(recommendation_params(
            request.emotion,
            request.limit,
            &request.preferred_genres,
        ));

        debug!(emotion = %request.emotion, limit = request.limit, "Querying catalog recommendations");
        let body: RecommendationsResponse = self.get_json("recommendations", &params).await?;

        let tracks: Vec<Track> = body.tracks.into_iter().map(Track::from).collect();
        info!(emotion = %request.emotion, count = tracks.len(), "Catalog recommendations received");
        Ok(tracks)
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Track>, CatalogError> {
        let params = self.with_market(vec![
            ("q".to_string(), query.to_string()),
            ("type".to_string(), "track".to_string()),
            ("limit".to_string(), limit.to_string()),
        ]);

        debug!(query, limit, "Searching catalog");
        let body: SearchResponse = self.get_json("search", &params).await?;
        Ok(body.tracks.items.into_iter().map(Track::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_normalization() {
        let raw: SpotifyTrack = serde_json::from_value(serde_json::json!({
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Never Gonna Give You Up",
            "artists": [{ "name": "Rick Astley" }, { "name": "Guest" }],
            "album": {
                "name": "Whenever You Need Somebody",
                "images": [{ "url": "https://i.scdn.co/large" }, { "url": "https://i.scdn.co/small" }]
            },
            "preview_url": null,
            "external_urls": { "spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC" },
            "popularity": 80,
            "duration_ms": 213573
        }))
        .unwrap();

        let track = Track::from(raw);
        assert_eq!(track.artist, "Rick Astley, Guest");
        assert_eq!(track.image_url.as_deref(), Some("https://i.scdn.co/large"));
        assert!(track.preview_url.is_none());
        assert_eq!(track.popularity, Some(80));
        assert_eq!(track.duration, 213573);
    }

    #[test]
    fn test_missing_external_url_synthesized() {
        let raw: SpotifyTrack = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "name": "Untitled",
            "artists": [],
            "album": { "name": "Demo" },
            "preview_url": "https://p.scdn.co/mp3-preview/abc",
            "duration_ms": 1000
        }))
        .unwrap();

        let track = Track::from(raw);
        assert_eq!(track.spotify_url, "https://open.spotify.com/track/abc");
        assert!(track.image_url.is_none());
        assert!(track.popularity.is_none());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_network() {
        let client = SpotifyClient::new(
            CatalogConfig {
                // Unroutable; any attempt to connect would fail differently
                token_url: "http://127.0.0.1:1/token".to_string(),
                ..CatalogConfig::default()
            },
            Arc::new(moodify_common::time::SystemClock),
        )
        .unwrap();

        assert!(!client.has_credentials());
        let err = client
            .recommend(&RecommendationRequest::new(moodify_common::Emotion::Happy, 5))
            .await
            .unwrap_err();
        match err {
            CatalogError::Authentication(msg) => assert!(msg.contains("not configured")),
            other => panic!("expected authentication error, got {:?}", other),
        }
    }
}
