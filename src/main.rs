use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

mod error;
mod handlers;
mod models;
mod services;
mod utils;

use handlers::create_app;
use models::config::AppConfig;
use services::analyzer::{AnalyzerApi, HttpAnalyzerClient};
use services::workflow::WorkflowController;
use utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration comes first so logging can honour it
    let loaded = AppConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let _log_guard = init_logging(&config.logging)?;
    if let Err(e) = &loaded {
        warn!("Configuration load failed, using defaults: {}", e);
    }

    info!("Starting LogSentinel Lite console");
    info!("Analysis service at {}", config.backend.base_url);

    let api: Arc<dyn AnalyzerApi> = Arc::new(
        HttpAnalyzerClient::new(&config.backend).context("building analysis service client")?,
    );
    let workflow = Arc::new(WorkflowController::new(api, &config));
    workflow.start();

    let app = create_app(Arc::clone(&workflow), config.server.upload_limit_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("binding {}", config.server.bind_address))?;
    info!("Console listening on http://{}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    workflow.shutdown().await;
    info!("Console stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
