mod api;
mod auth;
mod config;
mod models;
mod pagination;
mod query;
mod storage;
mod validate;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use auth::AuthService;
use config::{AuthMode, Config};
use storage::{DiagnosticsStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    info!("Using SQLite storage: {}", config.database.url);
    let store: Arc<dyn DiagnosticsStore> = Arc::new(
        SqliteStore::new(&config.database.url, config.database.max_connections).await?,
    );

    info!("Initializing database...");
    store.init().await?;
    info!("Database initialized successfully");

    // Initialize auth service
    let auth_service = Arc::new(AuthService::new(&config.auth)?);
    match config.auth.mode {
        AuthMode::None => {
            info!("🔓 Authentication is disabled - all API requests are allowed");
        }
        AuthMode::Token => {
            info!("🔐 Token authentication enabled (TTL: {}h)", config.auth.token_ttl_hours);
        }
    }

    let router = api::create_api_router(Arc::clone(&store), auth_service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 API server listening on http://{}", addr);
    info!("   - Diagnostics endpoints available at http://{}/api/diagnostics", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
