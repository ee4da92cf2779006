//! Analytics endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::analytics::{get_analytics_data, AnalyticsData, DEFAULT_DAYS_BACK, MAX_DAYS_BACK};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub days_back: Option<String>,
}

/// Parse `daysBack`: default when absent or invalid, clamped to `[0, MAX_DAYS_BACK]`
pub fn parse_days_back(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(0, MAX_DAYS_BACK))
        .unwrap_or(DEFAULT_DAYS_BACK)
}

/// GET /api/analytics?daysBack=
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsData>> {
    let days_back = parse_days_back(query.days_back.as_deref());
    let entries = state.history.all_entries().await?;
    Ok(Json(get_analytics_data(&entries, days_back, state.clock.now())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days_back() {
        assert_eq!(parse_days_back(None), 30);
        assert_eq!(parse_days_back(Some("7")), 7);
        assert_eq!(parse_days_back(Some("abc")), 30);
        assert_eq!(parse_days_back(Some("-4")), 0);
        assert_eq!(parse_days_back(Some("0")), 0);
    }

    #[test]
    fn test_huge_days_back_is_clamped() {
        assert_eq!(parse_days_back(Some("100000000")), MAX_DAYS_BACK);
        assert_eq!(parse_days_back(Some("9223372036854775807")), MAX_DAYS_BACK);

        let data = get_analytics_data(&[], parse_days_back(Some("100000000")), chrono::Utc::now());
        assert!(data.daily_trends.is_empty());
    }
}
