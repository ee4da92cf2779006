//! moodify-server - Emotion-driven music recommendation service
//!
//! Serves the Moodify HTTP API: emotion detection, catalog recommendations,
//! history, analytics, accounts and profiles.

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use moodify_common::config::{ConfigOverrides, HistoryBackend, ServerConfig};
use moodify_common::db::init_database;
use moodify_common::time::{Clock, SystemClock};
use moodify_server::catalog::{MusicCatalog, SpotifyClient};
use moodify_server::history::{HistoryStore, MemoryHistoryStore, SqliteHistoryStore};
use moodify_server::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on session lifetime (ten years)
const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

/// Command-line arguments for moodify-server
#[derive(Parser, Debug)]
#[command(name = "moodify-server")]
#[command(about = "Emotion-driven music recommendation server")]
#[command(version)]
struct Args {
    /// Path to moodify.toml (defaults to MOODIFY_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "MOODIFY_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "MOODIFY_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// SQLite database file
    #[arg(long, env = "MOODIFY_DATABASE_PATH")]
    database_path: Option<PathBuf>,

    /// Deployment label reported by /api/health
    #[arg(long, env = "MOODIFY_ENV")]
    environment: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MOODIFY_LOG_LEVEL")]
    log_level: Option<String>,

    /// History backend: sqlite or memory
    #[arg(long, env = "MOODIFY_HISTORY_BACKEND")]
    history_backend: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            config_path: args.config,
            port: args.port,
            bind_address: args.bind_address,
            database_path: args.database_path,
            environment: args.environment,
            log_level: args.log_level,
            history_backend: args.history_backend,
        }
    }
}

/// Initialize tracing; RUST_LOG overrides the configured level
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "moodify_server={level},moodify_common={level},tower_http={level}",
            level = config.logging.level
        )
        .into()
    });

    let (stderr_layer, file_layer) = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file));
            (None, Some(layer))
        }
        None => (Some(tracing_subscriber::fmt::layer()), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServerConfig::resolve(&args.into()).context("Failed to load configuration")?;

    init_tracing(&config)?;

    // Build identification first, before any slow startup work
    info!(
        "Starting Moodify server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Environment: {}", config.environment);
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let history: Arc<dyn HistoryStore> = match config.history_backend {
        HistoryBackend::Sqlite => Arc::new(SqliteHistoryStore::new(pool.clone(), clock.clone())),
        HistoryBackend::Memory => {
            warn!("Using in-memory history; entries are lost on restart");
            Arc::new(MemoryHistoryStore::new(clock.clone()))
        }
    };

    let catalog_configured = config.catalog.has_credentials();
    if catalog_configured {
        info!("Music catalog: {}", config.catalog.api_base_url);
    } else {
        warn!("Music catalog credentials not set; recommendations will fall back to empty results");
    }
    let catalog: Arc<dyn MusicCatalog> = Arc::new(
        SpotifyClient::new(config.catalog.clone(), clock.clone())
            .context("Failed to build catalog client")?,
    );

    let ttl_hours = config.session_ttl_hours.min(MAX_SESSION_TTL_HOURS) as i64;
    let state = AppState::new(pool, history, catalog, clock)
        .with_environment(config.environment.clone())
        .with_catalog_configured(catalog_configured)
        .with_session_ttl(Duration::hours(ttl_hours));
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("moodify-server listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
