// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::map_service::MapService;
use crate::application::performance_service::MarketPerformanceService;
use crate::domain::performance::PerformanceModel;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::csv_repository::{data_dir_exists, CsvRepository};
use crate::infrastructure::upstream_proxy::UpstreamProxy;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Create repository (infrastructure layer)
    let data_dir = config.analytics.data_dir.clone();
    if !data_dir_exists(&data_dir) {
        tracing::warn!(
            "No price or curve files under {}; API responses will report no data",
            data_dir.display()
        );
    }
    let repository = Arc::new(CsvRepository::new(data_dir));
    let catalog = Arc::new(config.catalog());
    tracing::info!("Loaded {} locations", catalog.entries().len());

    // Create services (application layer)
    let model = PerformanceModel::new(config.analytics.days_in_year);
    let performance_service =
        MarketPerformanceService::new(repository.clone(), catalog.clone(), model);
    let map_service = MapService::new(repository, catalog);
    let proxy = UpstreamProxy::new(Duration::from_secs(config.http_client.request_timeout_secs))
        .context("Failed to build upstream HTTP client")?;

    // Create application state
    let state = Arc::new(AppState {
        performance_service,
        map_service,
        proxy,
        proxy_routes: config.proxy_routes(),
        asset_origins: config.proxy.assets.clone(),
        as_of: config.analytics.as_of,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind_addr))?;
    tracing::info!("Starting gridstor-analytics on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
