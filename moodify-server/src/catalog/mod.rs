//! Recommendation gateway
//!
//! Wraps the third-party music catalog behind the [`MusicCatalog`] trait,
//! validates caller input before any network traffic, and implements the
//! degraded-mode fallback used by the recommendation endpoints.

pub mod rules;
pub mod spotify_client;
pub mod token_cache;

use async_trait::async_trait;
use moodify_common::{Emotion, Track};
use thiserror::Error;
use tracing::warn;

pub use spotify_client::SpotifyClient;
pub use token_cache::{IssuedToken, TokenCache};

/// Default number of tracks per recommendation or search
pub const DEFAULT_TRACK_LIMIT: u32 = 20;

/// Largest `limit` the catalog accepts
pub const MAX_TRACK_LIMIT: u32 = 50;

/// Catalog client errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Caller input rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// Token could not be obtained, or the catalog rejected it
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit, server error, transport failure, timeout or bad body
    #[error("Music service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Validated recommendation query
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub emotion: Emotion,
    pub limit: u32,
    /// Genres the user prefers; placed ahead of the emotion's own seeds
    pub preferred_genres: Vec<String>,
}

impl RecommendationRequest {
    pub fn new(emotion: Emotion, limit: u32) -> Self {
        Self {
            emotion,
            limit,
            preferred_genres: Vec::new(),
        }
    }
}

/// A source of tracks
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Tracks matching an emotion's mood profile
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Vec<Track>, CatalogError>;

    /// Free-text track search
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Track>, CatalogError>;
}

/// Check a requested track count, applying the default when absent
pub fn validate_limit(limit: Option<i64>) -> Result<u32, CatalogError> {
    match limit {
        None => Ok(DEFAULT_TRACK_LIMIT),
        Some(n) if (1..=i64::from(MAX_TRACK_LIMIT)).contains(&n) => Ok(n as u32),
        Some(_) => Err(CatalogError::Validation(format!(
            "Limit must be between 1 and {}",
            MAX_TRACK_LIMIT
        ))),
    }
}

/// Parse an emotion label supplied by a caller
pub fn parse_emotion(label: &str) -> Result<Emotion, CatalogError> {
    label
        .parse::<Emotion>()
        .map_err(|e| CatalogError::Validation(e.to_string()))
}

/// Fetch tracks for an emotion label
///
/// Both arguments are validated before the catalog is touched.
pub async fn get_recommendations_by_emotion(
    catalog: &dyn MusicCatalog,
    emotion: &str,
    limit: Option<i64>,
) -> Result<Vec<Track>, CatalogError> {
    let emotion = parse_emotion(emotion)?;
    let limit = validate_limit(limit)?;
    catalog
        .recommend(&RecommendationRequest::new(emotion, limit))
        .await
}

/// Tracks plus whether they came from the degraded path
#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    pub tracks: Vec<Track>,
    pub fallback: bool,
}

/// Recommend tracks, substituting the fallback list on upstream failure
///
/// The fallback list is empty. Validation errors still propagate.
pub async fn recommend_with_fallback(
    catalog: &dyn MusicCatalog,
    request: &RecommendationRequest,
) -> Result<RecommendationOutcome, CatalogError> {
    match catalog.recommend(request).await {
        Ok(tracks) => Ok(RecommendationOutcome {
            tracks,
            fallback: false,
        }),
        Err(CatalogError::Validation(msg)) => Err(CatalogError::Validation(msg)),
        Err(e) => {
            warn!(emotion = %request.emotion, "Catalog failed, serving fallback: {}", e);
            Ok(RecommendationOutcome {
                tracks: Vec::new(),
                fallback: true,
            })
        }
    }
}
