//! User account persistence

use chrono::{DateTime, Utc};
use moodify_common::api::auth::{hash_password, verify_password};
use moodify_common::uuid_utils::generate_id;
use moodify_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;

/// Public view of an account (credentials never leave this module)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub bio: String,
    pub favorite_genres: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a profile update may change; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
}

type UserRow = (String, String, String, String, String, DateTime<Utc>, DateTime<Utc>);

const USER_COLUMNS: &str = "guid, email, name, bio, favorite_genres, created_at, updated_at";

fn row_to_user(row: UserRow) -> Result<User> {
    let (id, email, name, bio, genres, created_at, updated_at) = row;
    let favorite_genres = serde_json::from_str(&genres)
        .map_err(|e| Error::Storage(format!("Corrupt favorite_genres for user {}: {}", id, e)))?;
    Ok(User {
        id,
        email,
        name,
        bio,
        favorite_genres,
        created_at,
        updated_at,
    })
}

/// True when the error is a UNIQUE constraint violation (duplicate email)
pub fn is_duplicate_email(err: &Error) -> bool {
    match err {
        Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Create an account; the password is stored as an Argon2 PHC string
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<User> {
    let id = generate_id();
    let hash = hash_password(password)?;

    sqlx::query(
        r#"
        INSERT INTO users (guid, email, name, bio, favorite_genres, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, '', '[]', ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(name)
    .bind(&hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        bio: String::new(),
        favorite_genres: Vec::new(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.map(row_to_user).transpose()
}

/// Look up an account by email and check its password
///
/// Returns `None` for an unknown email or a wrong password alike.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<Option<User>> {
    let creds: Option<(String, String)> =
        sqlx::query_as("SELECT guid, password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    match creds {
        Some((id, hash)) if verify_password(password, &hash)? => find_by_id(pool, &id).await,
        _ => Ok(None),
    }
}

/// Apply profile changes and return the updated account
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    changes: &ProfileChanges,
    now: DateTime<Utc>,
) -> Result<User> {
    let genres = changes
        .favorite_genres
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            bio = COALESCE(?, bio),
            email = COALESCE(?, email),
            favorite_genres = COALESCE(?, favorite_genres),
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(changes.name.as_deref())
    .bind(changes.bio.as_deref())
    .bind(changes.email.as_deref())
    .bind(genres)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("User not found".to_string()));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}
