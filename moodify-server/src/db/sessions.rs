//! Session token persistence

use chrono::{DateTime, Duration, Utc};
use moodify_common::api::auth::generate_session_token;
use moodify_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Issue a new session for `user_id` valid for `ttl`
pub async fn create_session(
    pool: &SqlitePool,
    user_id: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String> {
    let token = generate_session_token();
    let expires_at = now + ttl;

    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at_ms, expires_at_ms) VALUES (?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(user_id)
    .bind(now.timestamp_millis())
    .bind(expires_at.timestamp_millis())
    .execute(pool)
    .await?;

    Ok(token)
}

/// Resolve a token to its user id
///
/// Expired sessions are deleted on sight and reported as absent.
pub async fn lookup_session(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT user_id, expires_at_ms FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((user_id, expires_at_ms)) if now.timestamp_millis() < expires_at_ms => Ok(Some(user_id)),
        Some(_) => {
            debug!("Session expired, removing");
            delete_session(pool, token).await?;
            Ok(None)
        }
        None => Ok(None),
    }
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::create_user;
    use moodify_common::db::init_memory_database;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();
        let user = create_user(&pool, "s@example.com", "Sam", "password123", now)
            .await
            .unwrap();

        let token = create_session(&pool, &user.id, Duration::hours(1), now).await.unwrap();
        assert_eq!(lookup_session(&pool, &token, now).await.unwrap(), Some(user.id.clone()));

        delete_session(&pool, &token).await.unwrap();
        assert_eq!(lookup_session(&pool, &token, now).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_removed() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();
        let user = create_user(&pool, "e@example.com", "Eve", "password123", now)
            .await
            .unwrap();

        let token = create_session(&pool, &user.id, Duration::hours(1), now).await.unwrap();
        let later = now + Duration::hours(2);
        assert_eq!(lookup_session(&pool, &token, later).await.unwrap(), None);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
