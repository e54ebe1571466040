// HTTP request handlers
use crate::application::dashboard_api::{ChangeLogQuery, PredictionQuery, TimeSeriesQuery};
use crate::application::drilldown::PointSelection;
use crate::application::dashboard_session::SearchRequest;
use crate::application::topology_service::NodeEditRequest;
use crate::domain::timeseries::{FormattedTimeSeries, TimeSeriesRow};
use crate::domain::topology::NodeEdit;
use crate::infrastructure::http_response::{accepts_brotli, envelope_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::AppError;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct DrilldownView {
    #[serde(flatten)]
    pub series: FormattedTimeSeries,
    pub rows: Vec<TimeSeriesRow>,
}

async fn respond<T: Serialize>(result: Result<T, AppError>, headers: &HeaderMap) -> Response {
    match result {
        Ok(value) => match envelope_response(&value, accepts_brotli(headers)).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(err) => err.into_envelope().await,
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Calibration entries for a machine
pub async fn get_changelogs(
    Query(query): Query<ChangeLogQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let result = state.api.changelogs(&query).await.map_err(AppError::from);
    respond(result, &headers).await
}

/// Cycle predictions for a machine and window
pub async fn get_predictions(
    Query(query): Query<PredictionQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let result = state.api.predictions(&query).await.map_err(AppError::from);
    respond(result, &headers).await
}

/// Raw trace for one cycle
pub async fn get_timeseries(
    Query(query): Query<TimeSeriesQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let result = state.api.timeseries(&query).await.map_err(AppError::from);
    respond(result, &headers).await
}

/// Production line topology as stored
pub async fn get_tree_visual(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.api.tree_visual().await.map_err(AppError::from);
    respond(result, &headers).await
}

/// Tool choices for the search form
pub async fn get_tool_options(
    Query(query): Query<ChangeLogQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let result = state.session.tool_options(&query).await.map_err(AppError::from);
    respond(result, &headers).await
}

/// Run a search and build the scatter plot
pub async fn search(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    let result = state.session.search(request).await.map_err(AppError::from);
    respond(result, &headers).await
}

/// Actual vs ideal trace for a clicked point
pub async fn drill_down(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(point): Json<PointSelection>,
) -> impl IntoResponse {
    let result = state
        .session
        .drill_down(point)
        .await
        .map(|series| DrilldownView {
            rows: series.rows(),
            series,
        })
        .map_err(AppError::from);
    respond(result, &headers).await
}

/// Current session state
pub async fn session_state(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.session.view().await;
    respond(Ok(view), &headers).await
}

/// Laid-out topology
pub async fn get_topology(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.topology_service.flow_elements().await.map_err(AppError::from);
    respond(result, &headers).await
}

/// Edit one station and return the new layout
pub async fn update_node(
    Path(machine_id): Path<i64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NodeEditRequest>,
) -> impl IntoResponse {
    let edit = NodeEdit {
        machine_id,
        name: request.name,
        station_number: request.station_number,
        color: request.color,
    };
    let result = state.topology_service.apply_edit(edit).await.map_err(AppError::from);
    respond(result, &headers).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_session::DashboardSession;
    use crate::application::fixture_repository::memory::InMemoryFixtures;
    use crate::application::layered_layout::LayoutSettings;
    use crate::application::mock_data_service::MockDataService;
    use crate::application::topology_service::TopologyService;
    use crate::domain::prediction::AnomalyClass;
    use crate::domain::time::parse_timestamp;
    use crate::domain::topology::NodeColor;
    use axum::http::StatusCode;
    use chrono::{NaiveDate, NaiveTime};

    fn state(fixtures: InMemoryFixtures) -> State<Arc<AppState>> {
        let api = Arc::new(MockDataService::new(Arc::new(fixtures), 10));
        State(Arc::new(AppState {
            api: api.clone(),
            session: DashboardSession::new(api.clone()),
            topology_service: TopologyService::new(api, LayoutSettings::default()),
        }))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_changelogs_missing_machine_is_400() {
        let response = get_changelogs(Query(ChangeLogQuery::default()), HeaderMap::new(), state(InMemoryFixtures::sample()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["Status"], false);
        assert_eq!(body["Error"], "machine_id is required");
    }

    #[tokio::test]
    async fn test_predictions_envelope() {
        let query = PredictionQuery {
            machine_id: Some("m-1".to_string()),
            from_time: Some("2025-03-01T00:00:00".to_string()),
            to_time: Some("2025-04-01T00:00:00".to_string()),
        };

        let response = get_predictions(Query(query), HeaderMap::new(), state(InMemoryFixtures::sample()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["Status"], true);
        assert_eq!(body["Result"]["machine_id"], "m-1");
        assert_eq!(body["Result"]["cycles"].as_object().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_tree_visual_fixture_failure_is_500() {
        let response = get_tree_visual(HeaderMap::new(), state(InMemoryFixtures::broken()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["Error"], "Failed to load graph visualization data");
    }

    #[tokio::test]
    async fn test_search_then_drill_down() {
        let app = state(InMemoryFixtures::sample());
        let request = SearchRequest {
            machine_id: Some("m-1".to_string()),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            start_time: NaiveTime::from_hms_opt(0, 0, 0),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            end_time: NaiveTime::from_hms_opt(0, 0, 0),
            tool_sequence: Some("7".to_string()),
            signal: None,
        };

        let response = search(HeaderMap::new(), State(app.0.clone()), Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["Result"]["scatterPlotData"]["anomalyTrueData"][0]["anomaly"], "red");
        assert_eq!(body["Result"]["thresholds"].as_array().unwrap().len(), 2);

        let point = PointSelection {
            cycle_log_id: 6,
            anomaly: AnomalyClass::Anomaly,
            start_time: parse_timestamp("2025-03-05T08:00:00Z").unwrap(),
        };
        let response = drill_down(HeaderMap::new(), State(app.0.clone()), Json(point)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["Result"]["actual"], serde_json::json!([4.0, 8.0, 6.0]));
        assert_eq!(body["Result"]["rows"][1]["ideal"], 1.9);
    }

    #[tokio::test]
    async fn test_update_node_returns_new_classification() {
        let request = NodeEditRequest {
            name: "Press".to_string(),
            station_number: "ST-02".to_string(),
            color: NodeColor::White,
        };

        let response = update_node(Path(2), HeaderMap::new(), state(InMemoryFixtures::sample()), Json(request))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let node = body["Result"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["data"]["machine_id"] == 2)
            .cloned()
            .unwrap();
        assert_eq!(node["data"]["color"], "white");
        assert_eq!(node["style"]["background"], "#ffffff");
    }
}
