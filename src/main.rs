// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_api::DashboardApi;
use crate::application::dashboard_session::DashboardSession;
use crate::application::mock_data_service::MockDataService;
use crate::application::topology_service::TopologyService;
use crate::infrastructure::config::{DataSource, load_app_config};
use crate::infrastructure::fixture_store::JsonFixtureStore;
use crate::infrastructure::http_client::HttpDashboardApi;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let app_config = load_app_config()?;

    // Initialize tracing; RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&app_config.server.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Create data source (infrastructure layer)
    let api: Arc<dyn DashboardApi> = match app_config.data.source {
        DataSource::Fixtures => {
            let store = Arc::new(JsonFixtureStore::new(app_config.data.fixtures_dir.clone()));
            tracing::info!("Serving fixtures from {}", store.dir().display());
            Arc::new(MockDataService::new(store, app_config.data.changelog_limit))
        }
        DataSource::Remote => {
            let base_url = app_config
                .data
                .remote_base_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("data.remote_base_url is not set"))?;
            tracing::info!("Forwarding queries to {}", base_url);
            Arc::new(HttpDashboardApi::new(base_url))
        }
    };

    // Create services (application layer)
    let session = DashboardSession::new(api.clone());
    let topology_service = TopologyService::new(api.clone(), app_config.layout.clone());

    // Create application state
    let state = Arc::new(AppState {
        api,
        session,
        topology_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = app_config.server.bind.parse()?;
    tracing::info!("Starting cycle-monitor service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
