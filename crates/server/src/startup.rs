use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth};
use service::{runtime, storage::local::LocalFileStore};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load `config.toml` (or `CONFIG_PATH`), falling back to environment variables
fn load_config() -> Result<AppConfig, StartupError> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(error = %e, "config file unusable; using environment variables");
            AppConfig::from_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
        }
    }
}

/// Connect, migrate and wire services from configuration.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<auth::ServerState> {
    runtime::ensure_env(&cfg.storage.root)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::migrate(&db).await?;
    info!(service = "server", event = "migrated", "database schema up to date");

    let store = Arc::new(LocalFileStore::new(PathBuf::from(&cfg.storage.root), &cfg.storage.public_url));
    Ok(auth::ServerState::new(
        db,
        store,
        auth::ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone(), token_ttl_hours: cfg.auth.token_ttl_hours },
        &cfg.server.public_url,
        PathBuf::from(&cfg.storage.root),
        cfg.upload.max_body_bytes,
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(service = "server", event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = load_config()?;
    let state = build_state(&cfg).await?;

    // Build router
    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, public_url = %cfg.server.public_url, storage = %cfg.storage.root, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
