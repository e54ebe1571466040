// Remote dashboard API client - Same contract as the in-process fixtures
use crate::application::dashboard_api::{ChangeLogQuery, DashboardApi, PredictionQuery, TimeSeriesQuery};
use crate::application::error::ApiError;
use crate::domain::changelog::ChangeLogEntry;
use crate::domain::prediction::PredictionData;
use crate::domain::timeseries::TimeSeriesData;
use crate::domain::topology::TopologyGraph;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SuccessEnvelope<T> {
    #[serde(rename = "Result")]
    result: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl HttpDashboardApi {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn build_url(&self, route: &str, params: &[(&str, &Option<String>)]) -> String {
        let query: Vec<String> = params
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .map(|v| format!("{}={}", name, urlencoding::encode(v)))
            })
            .collect();

        if query.is_empty() {
            format!("{}{}", self.base_url, route)
        } else {
            format!("{}{}?{}", self.base_url, route, query.join("&"))
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to reach backend: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read backend response: {}", e)))?;

        decode_envelope(status, &body)
    }
}

/// Map a backend response onto the same outcomes the fixtures produce.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    if status.is_success() {
        return serde_json::from_slice::<SuccessEnvelope<T>>(body)
            .map(|e| e.result)
            .map_err(|e| ApiError::Transport(format!("Failed to parse backend response: {}", e)));
    }

    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_else(|| format!("Backend answered {}", status));

    match status {
        StatusCode::BAD_REQUEST if message.contains("not found") => Err(ApiError::NotFound(message)),
        StatusCode::BAD_REQUEST => Err(ApiError::Validation(message)),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
        _ => Err(ApiError::Transport(message)),
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn changelogs(&self, query: &ChangeLogQuery) -> Result<Vec<ChangeLogEntry>, ApiError> {
        let url = self.build_url(
            "/changelogs",
            &[
                ("limit", &query.limit),
                ("machine_id", &query.machine_id),
                ("from_time", &query.from_time),
                ("to_time", &query.to_time),
            ],
        );
        self.fetch(&url).await
    }

    async fn predictions(&self, query: &PredictionQuery) -> Result<PredictionData, ApiError> {
        let url = self.build_url(
            "/predictions",
            &[
                ("machine_id", &query.machine_id),
                ("from_time", &query.from_time),
                ("to_time", &query.to_time),
            ],
        );
        self.fetch(&url).await
    }

    async fn timeseries(&self, query: &TimeSeriesQuery) -> Result<TimeSeriesData, ApiError> {
        let url = self.build_url(
            "/timeseries",
            &[
                ("machine_id", &query.machine_id),
                ("cycle_log_id", &query.cycle_log_id),
                ("signal", &query.signal),
                ("anomaly", &query.anomaly),
            ],
        );
        self.fetch(&url).await
    }

    async fn tree_visual(&self) -> Result<TopologyGraph, ApiError> {
        let url = self.build_url("/treevisual", &[]);
        self.fetch(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_and_skips_missing() {
        let api = HttpDashboardApi::new("http://backend:9000/".to_string());
        let url = api.build_url(
            "/predictions",
            &[
                ("machine_id", &Some("m 1".to_string())),
                ("from_time", &None),
                ("to_time", &Some("2025-03-01T10:00:00".to_string())),
            ],
        );

        assert_eq!(url, "http://backend:9000/predictions?machine_id=m%201&to_time=2025-03-01T10%3A00%3A00");
    }

    #[test]
    fn test_decode_success_envelope() {
        let body = br#"{"Status": true, "Result": {"bypass_list": [2], "not_allowed_list": [], "prod_machine_map": []}}"#;
        let graph: TopologyGraph = decode_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(graph.bypass_list, vec![2]);
    }

    #[test]
    fn test_decode_error_envelopes() {
        let missing = br#"{"Status": false, "Error": "machine_id is required"}"#;
        let unknown = br#"{"Status": false, "Error": "Predictions for this machine id: x not found"}"#;

        assert_eq!(
            decode_envelope::<TopologyGraph>(StatusCode::BAD_REQUEST, missing),
            Err(ApiError::Validation("machine_id is required".to_string()))
        );
        assert!(matches!(
            decode_envelope::<TopologyGraph>(StatusCode::BAD_REQUEST, unknown),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            decode_envelope::<TopologyGraph>(StatusCode::INTERNAL_SERVER_ERROR, b"oops"),
            Err(ApiError::Transport(_))
        ));
    }
}
