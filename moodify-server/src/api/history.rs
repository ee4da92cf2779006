//! History endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use moodify_common::api::MessageResponse;
use moodify_common::history::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use moodify_common::time::parse_date_bound;
use moodify_common::{Emotion, EntryType, HistoryFilters};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use super::json_body;
use crate::error::ApiResult;
use crate::history::{self, ExportFormat, HistoryPage};
use crate::AppState;

/// Build filters from raw query parameters
///
/// Unknown `type`/`emotion` values are rejected; bad numbers and dates are not.
pub fn filters_from_query(params: &HashMap<String, String>) -> ApiResult<HistoryFilters> {
    let non_empty = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    let entry_type = non_empty("type").map(str::parse::<EntryType>).transpose()?;
    let emotion = non_empty("emotion").map(str::parse::<Emotion>).transpose()?;

    // Below 1 counts as invalid; above the cap is clamped
    let limit = non_empty("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n.min(i64::from(MAX_PAGE_SIZE)) as u32)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let page = non_empty("page")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(1);

    Ok(HistoryFilters {
        entry_type,
        emotion,
        start_date: non_empty("startDate").and_then(|v| parse_date_bound(v, false)),
        end_date: non_empty("endDate").and_then(|v| parse_date_bound(v, true)),
        limit,
        page,
    })
}

/// GET /api/history
pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<HistoryPage>> {
    let filters = filters_from_query(&params)?;
    let page = state.history.get_history(&filters).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct SaveHistoryRequest {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct SaveHistoryResponse {
    pub id: String,
    pub message: String,
}

/// POST /api/history
pub async fn save_history(
    State(state): State<AppState>,
    payload: Result<Json<SaveHistoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaveHistoryResponse>)> {
    let req = json_body(payload)?;
    let id = history::save_payload(state.history.as_ref(), &req.entry_type, req.data).await?;

    info!(entry_id = %id, entry_type = %req.entry_type, "History entry saved");
    Ok((
        StatusCode::CREATED,
        Json(SaveHistoryResponse {
            id,
            message: "History entry saved successfully".to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeleteHistoryQuery {
    pub id: Option<String>,
}

/// DELETE /api/history[?id=]
///
/// Without an id the whole history is cleared.
pub async fn delete_history(
    State(state): State<AppState>,
    Query(query): Query<DeleteHistoryQuery>,
) -> ApiResult<Json<MessageResponse>> {
    match query.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => {
            state.history.delete_entry(id).await?;
            info!(entry_id = %id, "History entry deleted");
            Ok(Json(MessageResponse::new("History entry deleted successfully")))
        }
        None => {
            state.history.clear().await?;
            info!("History cleared");
            Ok(Json(MessageResponse::new("All history cleared successfully")))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// GET /api/history/export?format=json|csv
pub async fn export_history(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let format: ExportFormat = query.format.as_deref().unwrap_or("json").parse()?;
    let exported = history::export_history(state.history.as_ref(), format).await?;

    let filename = format!(
        "moodify-history-{}.{}",
        state.clock.now().format("%Y-%m-%d"),
        format.extension()
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let filters = filters_from_query(&HashMap::new()).unwrap();
        assert_eq!(filters, HistoryFilters::default());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let filters = filters_from_query(&params(&[("limit", "abc"), ("page", "-3")])).unwrap();
        assert_eq!(filters.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filters.page, 1);
    }

    #[test]
    fn test_limit_clamped() {
        let filters = filters_from_query(&params(&[("limit", "500")])).unwrap();
        assert_eq!(filters.limit, MAX_PAGE_SIZE);
        let filters = filters_from_query(&params(&[("limit", "100")])).unwrap();
        assert_eq!(filters.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_non_positive_limit_falls_back_to_default() {
        for raw in ["0", "-5"] {
            let filters = filters_from_query(&params(&[("limit", raw)])).unwrap();
            assert_eq!(filters.limit, DEFAULT_PAGE_SIZE, "limit={}", raw);
        }
    }

    #[test]
    fn test_type_and_emotion() {
        let filters =
            filters_from_query(&params(&[("type", "recommendation"), ("emotion", "fear")])).unwrap();
        assert_eq!(filters.entry_type, Some(EntryType::Recommendation));
        assert_eq!(filters.emotion, Some(Emotion::Fear));

        assert!(filters_from_query(&params(&[("type", "mood")])).is_err());
        assert!(filters_from_query(&params(&[("emotion", "bored")])).is_err());
    }

    #[test]
    fn test_bad_dates_ignored() {
        let filters = filters_from_query(&params(&[("startDate", "yesterday")])).unwrap();
        assert!(filters.start_date.is_none());
    }
}
