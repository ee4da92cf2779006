//! User profile endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::{validate_email, validate_name, CurrentSession};
use super::json_body;
use crate::db::{self, users::is_duplicate_email, ProfileChanges, User};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MAX_BIO_CHARS: usize = 200;
const MAX_FAVORITE_GENRES: usize = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: User,
}

/// Check every supplied field and normalize it for storage
pub fn validate_profile_update(req: UpdateProfileRequest) -> ApiResult<ProfileChanges> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    if let Some(bio) = &req.bio {
        if bio.chars().count() > MAX_BIO_CHARS {
            return Err(ApiError::BadRequest(format!(
                "Bio must be at most {} characters",
                MAX_BIO_CHARS
            )));
        }
    }
    if let Some(email) = &req.email {
        validate_email(email.trim())?;
    }
    if let Some(genres) = &req.favorite_genres {
        if genres.len() > MAX_FAVORITE_GENRES {
            return Err(ApiError::BadRequest(format!(
                "At most {} favorite genres are allowed",
                MAX_FAVORITE_GENRES
            )));
        }
    }

    Ok(ProfileChanges {
        name: req.name.map(|n| n.trim().to_string()),
        bio: req.bio,
        email: req.email.map(|e| e.trim().to_string()),
        favorite_genres: req.favorite_genres.map(|genres| {
            genres
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect()
        }),
    })
}

/// GET /api/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = db::find_by_id(&state.db, &session.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(ProfileResponse {
        success: true,
        data: user,
    }))
}

/// PUT /api/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let changes = validate_profile_update(json_body(payload)?)?;

    let user = db::update_profile(&state.db, &session.user_id, &changes, state.clock.now())
        .await
        .map_err(|e| {
            if is_duplicate_email(&e) {
                ApiError::Conflict("Email already registered".to_string())
            } else {
                e.into()
            }
        })?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(ProfileResponse {
        success: true,
        data: user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_is_valid() {
        let changes = validate_profile_update(UpdateProfileRequest::default()).unwrap();
        assert!(changes.name.is_none() && changes.bio.is_none());
    }

    #[test]
    fn test_bio_limit() {
        let ok = UpdateProfileRequest {
            bio: Some("b".repeat(200)),
            ..Default::default()
        };
        assert!(validate_profile_update(ok).is_ok());

        let too_long = UpdateProfileRequest {
            bio: Some("b".repeat(201)),
            ..Default::default()
        };
        assert!(validate_profile_update(too_long).is_err());
    }

    #[test]
    fn test_genre_count_and_email() {
        let too_many = UpdateProfileRequest {
            favorite_genres: Some((0..21).map(|i| format!("g{}", i)).collect()),
            ..Default::default()
        };
        assert!(validate_profile_update(too_many).is_err());

        let bad_email = UpdateProfileRequest {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(validate_profile_update(bad_email).is_err());
    }

    #[test]
    fn test_blank_genres_dropped() {
        let req = UpdateProfileRequest {
            favorite_genres: Some(vec![" rock ".to_string(), "".to_string()]),
            ..Default::default()
        };
        let changes = validate_profile_update(req).unwrap();
        assert_eq!(changes.favorite_genres, Some(vec!["rock".to_string()]));
    }
}
