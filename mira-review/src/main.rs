//! mira-review - astrology session review service
//!
//! Serves the review UI and JSON API on 127.0.0.1:5080 by default.

use anyhow::{Context, Result};
use clap::Parser;
use mira_common::config::{load_toml_config, ReviewConfig};
use mira_review::cli::Args;
use mira_review::sync::SyncBridge;
use mira_review::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let secret_file = toml_config.secret_source().map(|p| p.to_path_buf());
    let config = ReviewConfig::resolve(args.overrides(), toml_config).context("Invalid configuration")?;

    // Bare levels apply to this crate; full directives pass through
    let filter = if config.log_level.contains('=') {
        config.log_level.clone()
    } else {
        format!("mira_review={0},mira_common={0},tower_http=info", config.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting mira-review v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &secret_file {
        warn!(path = %path.display(), "Config file contains secret_key; keep it readable only by the service user");
    }
    if config.uses_default_secret() {
        warn!("Using the default secret key; set MIRA_SECRET_KEY before exposing this service");
    }

    info!("Database: {}", config.database_path.display());
    let db = mira_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let bind_address = config.bind_address();
    let sync = SyncBridge::from_config(&config);
    let mut state = AppState::new(db, config);
    if let Some(bridge) = sync {
        state = state.with_sync(bridge);
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

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
            Ok(mut stream) => {
                stream.recv().await;
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
