// Repository trait for static fixture data
use crate::domain::changelog::ChangeLogEntry;
use crate::domain::prediction::{AnomalyClass, PredictionData};
use crate::domain::timeseries::CycleTrace;
use crate::domain::topology::TopologyGraph;
use async_trait::async_trait;

#[async_trait]
pub trait FixtureRepository: Send + Sync {
    /// All changelog entries, in fixture order
    async fn load_changelogs(&self) -> anyhow::Result<Vec<ChangeLogEntry>>;

    /// All per-machine prediction records, in fixture order
    async fn load_predictions(&self) -> anyhow::Result<Vec<PredictionData>>;

    /// Sample trace for a machine and anomaly class.
    /// `Ok(None)` when the machine is absent, `Ok(Some(default))` when the class is.
    async fn load_cycle_trace(
        &self,
        machine_id: &str,
        class: AnomalyClass,
    ) -> anyhow::Result<Option<CycleTrace>>;

    async fn load_topology(&self) -> anyhow::Result<TopologyGraph>;
}
