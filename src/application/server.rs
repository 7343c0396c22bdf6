use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::application::routes::app_router;
use crate::application::state::{AppState, AppStateConfig};
use crate::infrastructure::google_images::GOOGLE_API_URL;

pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub google_api_key: String,
    pub google_engine_id: String,
    pub storage_url: String,
    pub storage_key: String,
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let http_client = reqwest::Client::builder()
        .user_agent("TinyDreamers-Functions/1.0")
        .build()
        .context("failed to configure HTTP client")?;

    let state = AppState::new(AppStateConfig {
        http_client,
        google_api_url: GOOGLE_API_URL.to_string(),
        google_api_key: config.google_api_key,
        google_engine_id: config.google_engine_id,
        storage_url: config.storage_url.clone(),
        storage_key: config.storage_key,
    })?;

    if !state.image_search.is_configured() {
        warn!("Google API key or search engine id missing; cover-search will fail");
    }

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_address))?;

    let app = app_router(state);

    info!(
        address = %config.bind_address,
        storage = %config.storage_url,
        "starting functions server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("server shutdown complete");

    Ok(())
}

#[allow(clippy::expect_used)] // No way to shut down cleanly without signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
