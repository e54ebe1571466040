// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    drill_down, get_changelogs, get_predictions, get_timeseries, get_tool_options, get_topology, get_tree_visual,
    health_check, search, session_state, update_node,
};
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Compression is negotiated per response, so no CompressionLayer here
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/changelogs", get(get_changelogs))
        .route("/predictions", get(get_predictions))
        .route("/timeseries", get(get_timeseries))
        .route("/cycles", get(get_timeseries))
        .route("/treevisual", get(get_tree_visual))
        .route("/dashboard/search", post(search))
        .route("/dashboard/tools", get(get_tool_options))
        .route("/dashboard/drilldown", post(drill_down))
        .route("/dashboard/state", get(session_state))
        .route("/topology", get(get_topology))
        .route("/topology/nodes/:machine_id", put(update_node))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_session::DashboardSession;
    use crate::application::fixture_repository::memory::InMemoryFixtures;
    use crate::application::layered_layout::LayoutSettings;
    use crate::application::mock_data_service::MockDataService;
    use crate::application::topology_service::TopologyService;

    async fn serve() -> String {
        let api = Arc::new(MockDataService::new(Arc::new(InMemoryFixtures::sample()), 10));
        let state = Arc::new(AppState {
            api: api.clone(),
            session: DashboardSession::new(api.clone()),
            topology_service: TopologyService::new(api, LayoutSettings::default()),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_cycles_alias_serves_timeseries() {
        let base = serve().await;
        let query = "machine_id=m-1&cycle_log_id=6&signal=spindle_load&anomaly=red";

        let timeseries: serde_json::Value = reqwest::get(format!("{}/timeseries?{}", base, query))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let cycles: serde_json::Value = reqwest::get(format!("{}/cycles?{}", base, query))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(cycles, timeseries);
        assert_eq!(cycles["Result"]["data"]["6"]["cycle_data"]["spindle_load"]["0.5"], 8.0);
    }

    #[tokio::test]
    async fn test_timeseries_unknown_machine_over_http() {
        let base = serve().await;
        let response = reqwest::get(format!("{}/cycles?machine_id=m-9&cycle_log_id=6&signal=spindle_load", base))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["Error"], "Timeseries for this machine id: m-9 not found");
    }
}
