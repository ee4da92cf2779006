//! Accounts and session gating
//!
//! Protected routes accept the session token either as
//! `Authorization: Bearer <token>` or as a `session_token` cookie.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use moodify_common::api::{is_valid_email, MessageResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::json_body;
use crate::db::{self, users::is_duplicate_email, User};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const SESSION_COOKIE: &str = "session_token";

const MIN_PASSWORD_LEN: usize = 8;

/// Session attached to a request by [`session_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub user_id: String,
    pub token: String,
}

fn unauthorized() -> ApiError {
    ApiError::Unauthorized("Authentication required".to_string())
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    bearer
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(SESSION_COOKIE)
                .map(Cookie::value)
                .map(str::to_string)
        })
        .filter(|t| !t.is_empty())
}

/// Reject requests without a live session; otherwise attach [`CurrentSession`]
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_headers(request.headers()).ok_or_else(unauthorized)?;

    let user_id = db::lookup_session(&state.db, &token, state.clock.now())
        .await?
        .ok_or_else(|| {
            debug!("Unknown or expired session token");
            unauthorized()
        })?;

    request
        .extensions_mut()
        .insert(CurrentSession { user_id, token });
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

pub(crate) fn validate_name(name: &str) -> ApiResult<()> {
    let len = name.trim().chars().count();
    if !(2..=50).contains(&len) {
        return Err(ApiError::BadRequest(
            "Name must be between 2 and 50 characters".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> ApiResult<()> {
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let req = json_body(payload)?;
    let email = req.email.trim();
    validate_email(email)?;
    validate_name(&req.name)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let now = state.clock.now();
    let user = db::create_user(&state.db, email, req.name.trim(), &req.password, now)
        .await
        .map_err(|e| {
            if is_duplicate_email(&e) {
                ApiError::Conflict("Email already registered".to_string())
            } else {
                e.into()
            }
        })?;

    let token = db::create_session(&state.db, &user.id, state.session_ttl, now).await?;
    info!(user_id = %user.id, "Account registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let req = json_body(payload)?;

    let user = db::authenticate(&state.db, req.email.trim(), &req.password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let token = db::create_session(&state.db, &user.id, state.session_ttl, state.clock.now()).await?;
    info!(user_id = %user.id, "Logged in");

    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<Json<MessageResponse>> {
    db::delete_session(&state.db, &session.token).await?;
    info!(user_id = %session.user_id, "Logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}
