//! moodify-server library
//!
//! HTTP service mapping detected emotions to music recommendations, with
//! history tracking, analytics and user profiles.

use axum::Router;
use chrono::{DateTime, Duration, Utc};
use moodify_common::time::Clock;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod api;
pub mod catalog;
pub mod db;
pub mod error;
pub mod history;
pub mod pagination;

use catalog::MusicCatalog;
use history::HistoryStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Accounts and sessions (and history, for the SQLite backend)
    pub db: SqlitePool,
    pub history: Arc<dyn HistoryStore>,
    pub catalog: Arc<dyn MusicCatalog>,
    pub clock: Arc<dyn Clock>,
    /// Service start time, for uptime reporting
    pub startup_time: DateTime<Utc>,
    /// Deployment label reported by the health endpoint
    pub environment: String,
    /// Whether catalog client credentials were supplied
    pub catalog_configured: bool,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        history: Arc<dyn HistoryStore>,
        catalog: Arc<dyn MusicCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            startup_time: clock.now(),
            db,
            history,
            catalog,
            clock,
            environment: "development".to_string(),
            catalog_configured: false,
            session_ttl: Duration::days(30),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_catalog_configured(mut self, configured: bool) -> Self {
        self.catalog_configured = configured;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

/// Build application router
///
/// Recommendation, search, profile and logout routes require a session;
/// everything else is public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require a session)
    let protected = Router::new()
        .route(
            "/api/recommendations",
            post(api::create_recommendations).get(api::get_recommendations),
        )
        .route("/api/music/search", get(api::search_music))
        .route(
            "/api/user/profile",
            get(api::get_profile).put(api::update_profile),
        )
        .route("/api/auth/logout", post(api::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    // Public routes
    let public = Router::new()
        .route("/api/auth/register", post(api::register))
        .route("/api/auth/login", post(api::login))
        .route(
            "/api/history",
            get(api::get_history)
                .post(api::save_history)
                .delete(api::delete_history),
        )
        .route("/api/history/export", get(api::export_history))
        .route("/api/emotion/detect", post(api::detect_emotion))
        .route("/api/analytics", get(api::get_analytics))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
