// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tank_gauges::infrastructure::config::load_dashboard_config;
use tank_gauges::infrastructure::http_repository::HttpTankRepository;
use tank_gauges::{AppState, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tank_gauges=debug")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpTankRepository::new(config.backend.clone())?);

    // Create services (application layer)
    let state = Arc::new(AppState::new(
        repository,
        Duration::from_secs(config.refresh.interval_secs),
        config.refresh.use_status_endpoint,
        config.history.limit,
    ));

    // Site list first so the selector is populated; the first tick renders cards
    state.site_service.refresh(&state.dashboard).await;
    tokio::spawn(state.driver.clone().run());

    // Build router (presentation layer)
    let router = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address '{}'", config.server.bind))?;
    tracing::info!(
        "Starting tank-gauges on {} (backend {})",
        addr,
        config.backend.base_url
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
