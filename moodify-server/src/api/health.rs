//! Health check endpoint
//!
//! Reports uptime and a few cheap diagnostics. A failing database check turns
//! the response into a 503.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MemoryCheck {
    pub status: String,
    /// Resident set size, where the platform exposes it
    #[serde(rename = "rssBytes", skip_serializing_if = "Option::is_none")]
    pub rss_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvCheck {
    pub status: String,
    pub catalog_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub server: String,
    pub memory: MemoryCheck,
    pub env: EnvCheck,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since service started
    pub uptime: u64,
    pub version: String,
    pub environment: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// VmRSS from /proc/self/status (Linux only)
fn resident_memory_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/self/status").ok()?;
        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                // Format: "VmRSS:    12345 kB"
                let kb: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
                return Some(kb * 1024);
            }
        }
        None
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Response {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.db).await {
        error!("Health check database probe failed: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(UnhealthyResponse {
                status: "unhealthy".to_string(),
                error: format!("Database check failed: {}", e),
            }),
        )
            .into_response();
    }

    let now = state.clock.now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now,
        uptime,
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.environment.clone(),
        checks: HealthChecks {
            server: "ok".to_string(),
            memory: MemoryCheck {
                status: "ok".to_string(),
                rss_bytes: resident_memory_bytes(),
            },
            env: EnvCheck {
                status: if state.catalog_configured { "ok" } else { "degraded" }.to_string(),
                catalog_configured: state.catalog_configured,
            },
        },
    })
    .into_response()
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}
