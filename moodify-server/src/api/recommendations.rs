//! Recommendation endpoints
//!
//! Both forms share one response shape and one failure policy: catalog
//! outages produce a 200 with `fallback: true` and no tracks.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use moodify_common::{Emotion, Track};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::json_body;
use crate::catalog::{self, RecommendationRequest};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecommendationRequest {
    pub emotion: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub user_preferences: Option<UserPreferences>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub emotion: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationData {
    pub emotion: Emotion,
    pub confidence: Option<f64>,
    pub tracks: Vec<Track>,
    pub generated_at: DateTime<Utc>,
    pub total_tracks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub data: RecommendationData,
}

fn validate_confidence(confidence: Option<f64>) -> ApiResult<()> {
    match confidence {
        Some(c) if !(0.0..=1.0).contains(&c) => Err(ApiError::BadRequest(
            "Confidence must be between 0 and 1".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn recommend(
    state: &AppState,
    request: RecommendationRequest,
    confidence: Option<f64>,
) -> ApiResult<Json<RecommendationResponse>> {
    let outcome = catalog::recommend_with_fallback(state.catalog.as_ref(), &request).await?;

    info!(
        emotion = %request.emotion,
        limit = request.limit,
        count = outcome.tracks.len(),
        fallback = outcome.fallback,
        "Recommendations served"
    );

    Ok(Json(RecommendationResponse {
        success: true,
        data: RecommendationData {
            emotion: request.emotion,
            confidence,
            total_tracks: outcome.tracks.len(),
            tracks: outcome.tracks,
            generated_at: state.clock.now(),
            fallback: outcome.fallback.then_some(true),
        },
    }))
}

/// POST /api/recommendations
pub async fn create_recommendations(
    State(state): State<AppState>,
    payload: Result<Json<CreateRecommendationRequest>, JsonRejection>,
) -> ApiResult<Json<RecommendationResponse>> {
    let req = json_body(payload)?;

    let emotion = catalog::parse_emotion(&req.emotion)?;
    validate_confidence(req.confidence)?;
    let limit = catalog::validate_limit(req.limit)?;

    let request = RecommendationRequest {
        emotion,
        limit,
        preferred_genres: req
            .user_preferences
            .and_then(|p| p.genres)
            .unwrap_or_default(),
    };
    recommend(&state, request, req.confidence).await
}

/// GET /api/recommendations?emotion=&limit=
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<Json<RecommendationResponse>> {
    let label = query
        .emotion
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Emotion parameter is required".to_string()))?;
    let emotion = catalog::parse_emotion(label)?;

    let limit = match query.limit.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        None => None,
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            ApiError::BadRequest("Limit must be an integer between 1 and 50".to_string())
        })?),
    };
    let limit = catalog::validate_limit(limit)?;

    recommend(&state, RecommendationRequest::new(emotion, limit), None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bounds() {
        assert!(validate_confidence(None).is_ok());
        assert!(validate_confidence(Some(0.0)).is_ok());
        assert!(validate_confidence(Some(1.0)).is_ok());
        assert!(validate_confidence(Some(1.5)).is_err());
        assert!(validate_confidence(Some(-0.5)).is_err());
    }

    #[test]
    fn test_fallback_flag_omitted_on_success() {
        let data = RecommendationData {
            emotion: Emotion::Happy,
            confidence: None,
            tracks: vec![],
            generated_at: Utc::now(),
            total_tracks: 0,
            fallback: None,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("fallback").is_none());
        assert!(json["confidence"].is_null());
        assert_eq!(json["totalTracks"], 0);
    }
}
