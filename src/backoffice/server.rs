use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use mintdesk_common::MintExecutor;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api::{self, AppState, SharedState};
use super::db::{BackofficeDb, DbHandle};
use crate::config::MintdeskConfig;

/// Configuration for the back-office server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3141,
            db_path: PathBuf::from(".mintdesk/mintdesk.db"),
            dev_mode: false,
        }
    }
}

impl From<&MintdeskConfig> for ServerConfig {
    fn from(config: &MintdeskConfig) -> Self {
        Self {
            host: config.toml.server.host.clone(),
            port: config.toml.server.port,
            db_path: config.db_path(),
            dev_mode: config.toml.server.dev_mode,
        }
    }
}

/// Build the full application router with API and WebSocket routes.
pub fn build_router(state: SharedState, dev_mode: bool) -> Router {
    let app = api::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());
    if dev_mode {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Open the database and serve until Ctrl+C.
pub async fn start_server(config: ServerConfig, executor: MintExecutor) -> Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = BackofficeDb::new(&config.db_path).context("Failed to initialize back-office database")?;
    let mode = executor.mode();
    let state = Arc::new(AppState::new(DbHandle::new(db), executor));
    let app = build_router(state, config.dev_mode);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        db = %config.db_path.display(),
        batch_mode = %mode,
        dev_mode = config.dev_mode,
        "Back-office server listening"
    );
    println!("mintdesk running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
