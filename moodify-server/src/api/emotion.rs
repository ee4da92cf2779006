//! Emotion detection endpoint
//!
//! The browser runs the face-expression classifier and posts its raw scores;
//! this turns them into a validated [`EmotionResult`].

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use moodify_common::{EmotionResult, HistoryData};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use super::json_body;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DetectEmotionRequest {
    /// Classifier expression name → score
    pub expressions: HashMap<String, f64>,
    /// Append the result to history
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectEmotionResponse {
    pub success: bool,
    pub data: EmotionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
}

/// POST /api/emotion/detect
pub async fn detect_emotion(
    State(state): State<AppState>,
    payload: Result<Json<DetectEmotionRequest>, JsonRejection>,
) -> ApiResult<Json<DetectEmotionResponse>> {
    let req = json_body(payload)?;
    let result = EmotionResult::from_expressions(&req.expressions, state.clock.now())?;

    let history_id = if req.save {
        Some(
            state
                .history
                .save(HistoryData::Emotion(result.clone()))
                .await?,
        )
    } else {
        None
    };

    info!(
        emotion = %result.emotion,
        confidence = result.confidence,
        saved = history_id.is_some(),
        "Emotion detected"
    );

    Ok(Json(DetectEmotionResponse {
        success: true,
        data: result,
        history_id,
    }))
}
