// Dashboard API boundary - the four response shapes the pipeline consumes
use crate::application::error::ApiError;
use crate::domain::changelog::ChangeLogEntry;
use crate::domain::prediction::PredictionData;
use crate::domain::timeseries::TimeSeriesData;
use crate::domain::topology::TopologyGraph;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw query parameters; validation is the service's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogQuery {
    pub machine_id: Option<String>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub machine_id: Option<String>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesQuery {
    pub machine_id: Option<String>,
    pub cycle_log_id: Option<String>,
    pub signal: Option<String>,
    pub anomaly: Option<String>,
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Calibration entries for a machine (`GET /changelogs`)
    async fn changelogs(&self, query: &ChangeLogQuery) -> Result<Vec<ChangeLogEntry>, ApiError>;

    /// Cycle predictions for a machine and window (`GET /predictions`)
    async fn predictions(&self, query: &PredictionQuery) -> Result<PredictionData, ApiError>;

    /// Raw trace of one cycle (`GET /timeseries`)
    async fn timeseries(&self, query: &TimeSeriesQuery) -> Result<TimeSeriesData, ApiError>;

    /// Production line topology (`GET /treevisual`)
    async fn tree_visual(&self) -> Result<TopologyGraph, ApiError>;
}
