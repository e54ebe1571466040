// Mock data service - Query filtering over static fixtures
use crate::application::dashboard_api::{ChangeLogQuery, DashboardApi, PredictionQuery, TimeSeriesQuery};
use crate::application::error::ApiError;
use crate::application::fixture_repository::FixtureRepository;
use crate::domain::changelog::ChangeLogEntry;
use crate::domain::ordered_map::OrderedMap;
use crate::domain::prediction::{AnomalyClass, PredictionData, parse_epoch_key};
use crate::domain::time::parse_timestamp;
use crate::domain::timeseries::TimeSeriesData;
use crate::domain::topology::TopologyGraph;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct MockDataService {
    repository: Arc<dyn FixtureRepository>,
    default_limit: usize,
}

impl MockDataService {
    pub fn new(repository: Arc<dyn FixtureRepository>, default_limit: usize) -> Self {
        Self {
            repository,
            default_limit,
        }
    }
}

/// Treat empty query values the same as missing ones.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_param(name: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_timestamp(raw).map_err(|e| ApiError::Validation(format!("{}: {}", name, e)))
}

fn fixture_error(what: &str, err: anyhow::Error) -> ApiError {
    tracing::error!("Failed to load {} fixture: {:#}", what, err);
    ApiError::Fixture(format!("Failed to load {} data", what))
}

#[async_trait]
impl DashboardApi for MockDataService {
    async fn changelogs(&self, query: &ChangeLogQuery) -> Result<Vec<ChangeLogEntry>, ApiError> {
        let machine_id = present(&query.machine_id)
            .ok_or_else(|| ApiError::Validation("machine_id is required".to_string()))?;

        let limit = present(&query.limit)
            .and_then(|l| l.parse::<usize>().ok())
            .filter(|&l| l > 0)
            .unwrap_or(self.default_limit);

        let window = match (present(&query.from_time), present(&query.to_time)) {
            (Some(from), Some(to)) => Some((parse_param("from_time", from)?, parse_param("to_time", to)?)),
            _ => None,
        };

        let all = self
            .repository
            .load_changelogs()
            .await
            .map_err(|e| fixture_error("changelog", e))?;

        let filtered: Vec<ChangeLogEntry> = all
            .into_iter()
            .filter(|entry| entry.machine_id == machine_id)
            .filter(|entry| window.is_none_or(|(from, to)| entry.overlaps(from, to)))
            .take(limit)
            .collect();

        tracing::debug!("Returning {} changelog entries for machine {}", filtered.len(), machine_id);
        Ok(filtered)
    }

    async fn predictions(&self, query: &PredictionQuery) -> Result<PredictionData, ApiError> {
        let (machine_id, from_time, to_time) = match (
            present(&query.machine_id),
            present(&query.from_time),
            present(&query.to_time),
        ) {
            (Some(m), Some(f), Some(t)) => (m, f, t),
            _ => return Err(ApiError::Validation("Missing required query params".to_string())),
        };

        let from = parse_param("from_time", from_time)?;
        let to = parse_param("to_time", to_time)?;

        let all = self
            .repository
            .load_predictions()
            .await
            .map_err(|e| fixture_error("prediction", e))?;

        let mut prediction = all
            .into_iter()
            .find(|p| p.machine_id == machine_id)
            .ok_or_else(|| {
                ApiError::NotFound(format!("Predictions for this machine id: {} not found", machine_id))
            })?;

        let (from_s, to_s) = (from.timestamp(), to.timestamp());
        let total = prediction.cycles.len();
        prediction.cycles.retain(|key, _| match parse_epoch_key(key) {
            Some(epoch) => from_s <= epoch && epoch <= to_s,
            None => {
                tracing::warn!("Dropping cycle with non-numeric epoch key '{}'", key);
                false
            }
        });

        tracing::debug!(
            "Machine {} has {} of {} cycles in [{}, {}]",
            machine_id,
            prediction.cycles.len(),
            total,
            from,
            to
        );

        prediction.from_time = from;
        prediction.to_time = to;
        Ok(prediction)
    }

    async fn timeseries(&self, query: &TimeSeriesQuery) -> Result<TimeSeriesData, ApiError> {
        let (machine_id, cycle_log_id) = match (
            present(&query.machine_id),
            present(&query.cycle_log_id),
            present(&query.signal),
        ) {
            (Some(m), Some(c), Some(_)) => (m, c),
            _ => return Err(ApiError::Validation("Missing required query parameters".to_string())),
        };

        let class = match present(&query.anomaly) {
            Some(raw) => raw
                .parse::<AnomalyClass>()
                .map_err(|e| ApiError::Validation(format!("Unknown anomaly class '{}'", e.0)))?,
            None => AnomalyClass::NoAnomaly,
        };

        let trace = self
            .repository
            .load_cycle_trace(machine_id, class)
            .await
            .map_err(|e| fixture_error("timeseries", e))?
            .ok_or_else(|| ApiError::NotFound(format!("Timeseries for this machine id: {} not found", machine_id)))?;

        let mut data = OrderedMap::new();
        data.insert(cycle_log_id, trace);
        Ok(TimeSeriesData { data })
    }

    async fn tree_visual(&self) -> Result<TopologyGraph, ApiError> {
        self.repository
            .load_topology()
            .await
            .map_err(|e| fixture_error("graph visualization", e))
    }
}
