//! Supply-chain marketplace server
//!
//! Serves the marketplace, wallet and dashboard APIs over HTTP with a
//! WebSocket feed of ledger events.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use supplychain_server::config::{Config, StorageBackend};
use supplychain_server::middleware::RateLimiter;
use supplychain_server::routes;
use supplychain_server::state::AppState;
use supplychain_server::storage::{FileStorage, MemoryStorage, Storage};

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting server");

    let storage: Arc<dyn Storage> = match &config.storage {
        StorageBackend::File(dir) => {
            tracing::info!(path = %dir.display(), "Using file storage");
            Arc::new(
                FileStorage::open(dir)
                    .with_context(|| format!("Failed to open data directory {}", dir.display()))?,
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data will not survive a restart");
            Arc::new(MemoryStorage::new())
        }
    };

    // Create shared app state
    let app_state =
        AppState::new(storage, &config).context("Failed to load application state")?;
    let wallet_service = app_state.wallet_service.clone();

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    let cleanup = rate_limiter.spawn_cleanup(RATE_LIMIT_CLEANUP_INTERVAL);

    let app = routes::app_router(app_state, &config, rate_limiter);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket available at ws://{}/ws", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cleanup.abort();
    wallet_service.shutdown().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
