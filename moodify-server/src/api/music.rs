//! Catalog search endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use moodify_common::Track;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{self, DEFAULT_TRACK_LIMIT};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchData {
    pub query: String,
    pub tracks: Vec<Track>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: SearchData,
}

/// GET /api/music/search?q=&limit=
///
/// Upstream failures surface as 500; search has no fallback.
pub async fn search_music(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    let len = q.chars().count();
    if len == 0 || len > MAX_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Search query must be between 1 and {} characters",
            MAX_QUERY_CHARS
        )));
    }

    let limit = match query.limit.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        None => DEFAULT_TRACK_LIMIT,
        Some(raw) => {
            let n = raw.parse::<i64>().map_err(|_| {
                ApiError::BadRequest("Limit must be an integer between 1 and 50".to_string())
            })?;
            catalog::validate_limit(Some(n))?
        }
    };

    debug!(query = q, limit, "Music search");
    let tracks = state.catalog.search(q, limit).await?;

    Ok(Json(SearchResponse {
        success: true,
        data: SearchData {
            query: q.to_string(),
            total: tracks.len(),
            tracks,
        },
    }))
}
