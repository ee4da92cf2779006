//! HTTP API handlers for moodify-server

pub mod analytics;
pub mod auth;
pub mod buildinfo;
pub mod emotion;
pub mod health;
pub mod history;
pub mod music;
pub mod profile;
pub mod recommendations;

pub use analytics::get_analytics;
pub use auth::{login, logout, register, session_middleware, CurrentSession};
pub use buildinfo::get_build_info;
pub use emotion::detect_emotion;
pub use health::health_routes;
pub use history::{delete_history, export_history, get_history, save_history};
pub use music::search_music;
pub use profile::{get_profile, update_profile};
pub use recommendations::{create_recommendations, get_recommendations};

use axum::{extract::rejection::JsonRejection, Json};

use crate::error::{ApiError, ApiResult};

/// Unwrap a JSON body, turning malformed input into a 400
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text())))
}
