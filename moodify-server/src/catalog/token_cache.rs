//! Bearer token cache for the catalog client
//!
//! Expiry is evaluated against an injected [`Clock`] on every call; there is
//! no background refresh.

use chrono::{DateTime, Duration, Utc};
use moodify_common::time::Clock;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::CatalogError;

/// Tokens are treated as expired this long before the issuer says so
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Longer lifetimes from the issuer are cut to one day
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Token as returned by the token endpoint
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct TokenCache {
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Cached token if it has not expired yet
    pub async fn get(&self) -> Option<String> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|t| self.clock.now() < t.expires_at)
            .map(|t| t.access_token.clone())
    }

    /// Return the cached token, or run `fetch` and cache its result
    ///
    /// The lock is held across `fetch` so concurrent callers share one refresh.
    pub async fn refresh_if_expired<F, Fut>(&self, fetch: F) -> Result<String, CatalogError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<IssuedToken, CatalogError>>,
    {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(cached) = slot.as_ref() {
            if now < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
            debug!("Catalog token expired, refreshing");
        }

        let issued = fetch().await?;
        let lifetime = i64::try_from(issued.expires_in)
            .unwrap_or(MAX_TOKEN_LIFETIME_SECS)
            .min(MAX_TOKEN_LIFETIME_SECS)
            .saturating_sub(EXPIRY_MARGIN_SECS)
            .max(0);
        let expires_at = now
            .checked_add_signed(Duration::seconds(lifetime))
            .ok_or_else(|| CatalogError::Authentication("Invalid token expiry".to_string()))?;

        debug!(expires_at = %expires_at, "Cached new catalog token");
        *slot = Some(CachedToken {
            access_token: issued.access_token.clone(),
            expires_at,
        });
        Ok(issued.access_token)
    }

    /// Drop the cached token (e.g. after the catalog rejects it)
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodify_common::time::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn issued(token: &str, expires_in: u64) -> IssuedToken {
        IssuedToken {
            access_token: token.to_string(),
            expires_in,
        }
    }

    #[tokio::test]
    async fn test_token_reused_until_expiry() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = TokenCache::new(clock.clone());
        let fetches = AtomicUsize::new(0);

        let fetch = |name: &'static str| {
            fetches.fetch_add(1, Ordering::SeqCst);
            async move { Ok(issued(name, 3600)) }
        };

        assert_eq!(cache.refresh_if_expired(|| fetch("first")).await.unwrap(), "first");
        clock.advance(Duration::seconds(3000));
        assert_eq!(cache.refresh_if_expired(|| fetch("second")).await.unwrap(), "first");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        // Past expires_in minus the safety margin
        clock.advance(Duration::seconds(541));
        assert!(cache.get().await.is_none());
        assert_eq!(cache.refresh_if_expired(|| fetch("second")).await.unwrap(), "second");
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_empty() {
        let cache = TokenCache::new(Arc::new(ManualClock::new(Utc::now())));
        let result = cache
            .refresh_if_expired(|| async {
                Err(CatalogError::Authentication("token endpoint down".into()))
            })
            .await;
        assert!(matches!(result, Err(CatalogError::Authentication(_))));
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_lifetime_capped_to_one_day() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = TokenCache::new(clock.clone());
        cache
            .refresh_if_expired(|| async { Ok(issued("long", u64::MAX)) })
            .await
            .unwrap();
        assert_eq!(cache.get().await.as_deref(), Some("long"));

        clock.advance(Duration::seconds(MAX_TOKEN_LIFETIME_SECS));
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_rejected() {
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::seconds(10)));
        let cache = TokenCache::new(clock);
        let result = cache
            .refresh_if_expired(|| async { Ok(issued("late", 3600)) })
            .await;
        assert!(matches!(result, Err(CatalogError::Authentication(_))));
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = TokenCache::new(Arc::new(ManualClock::new(Utc::now())));
        cache
            .refresh_if_expired(|| async { Ok(issued("a", 3600)) })
            .await
            .unwrap();
        assert_eq!(cache.get().await.as_deref(), Some("a"));

        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }
}
