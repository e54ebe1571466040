// JSON fixture files on disk, re-read on every query
use crate::application::fixture_repository::FixtureRepository;
use crate::domain::changelog::ChangeLogEntry;
use crate::domain::prediction::{AnomalyClass, PredictionData};
use crate::domain::timeseries::CycleTrace;
use crate::domain::topology::TopologyGraph;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CHANGELOG_FILE: &str = "changelog.json";
const PREDICTION_FILE: &str = "prediction.json";
const CYCLE_DATA_FILE: &str = "cycle_data.json";
const TOPOLOGY_FILE: &str = "treevisual.json";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "Result")]
    result: T,
}

#[derive(Debug, Deserialize)]
struct CycleDataFile {
    /// machine id -> color class -> trace
    machines: HashMap<String, HashMap<String, CycleTrace>>,
}

#[derive(Debug, Clone)]
pub struct JsonFixtureStore {
    dir: PathBuf,
}

impl JsonFixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;

        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse fixture {}", path.display()))
    }
}

#[async_trait]
impl FixtureRepository for JsonFixtureStore {
    async fn load_changelogs(&self) -> Result<Vec<ChangeLogEntry>> {
        let envelope: Envelope<Vec<ChangeLogEntry>> = self.read(CHANGELOG_FILE).await?;
        Ok(envelope.result)
    }

    async fn load_predictions(&self) -> Result<Vec<PredictionData>> {
        let envelope: Envelope<Vec<PredictionData>> = self.read(PREDICTION_FILE).await?;
        Ok(envelope.result)
    }

    async fn load_cycle_trace(&self, machine_id: &str, class: AnomalyClass) -> Result<Option<CycleTrace>> {
        let mut file: CycleDataFile = self.read(CYCLE_DATA_FILE).await?;
        Ok(file
            .machines
            .remove(machine_id)
            .map(|mut by_class| by_class.remove(class.color()).unwrap_or_default()))
    }

    async fn load_topology(&self) -> Result<TopologyGraph> {
        self.read(TOPOLOGY_FILE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> JsonFixtureStore {
        JsonFixtureStore::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    #[tokio::test]
    async fn test_bundled_fixtures_parse() {
        let store = bundled();

        let changelogs = store.load_changelogs().await.unwrap();
        assert!(!changelogs.is_empty());
        assert!(changelogs.iter().all(|l| !l.config_parameters.signals.is_empty()));

        let predictions = store.load_predictions().await.unwrap();
        assert_eq!(predictions.len(), 2);

        let topology = store.load_topology().await.unwrap();
        assert!(!topology.prod_machine_map.is_empty());
    }

    #[tokio::test]
    async fn test_bundled_traces_match_learned_length() {
        let store = bundled();
        let changelogs = store.load_changelogs().await.unwrap();
        let first = &changelogs[0];
        let signal = &first.config_parameters.signals[0];

        let trace = store
            .load_cycle_trace(&first.machine_id, AnomalyClass::Anomaly)
            .await
            .unwrap()
            .unwrap();
        let samples = trace.cycle_data.get(signal).unwrap().len();

        for sequence in first.config_parameters.tool_sequence_map.keys() {
            assert_eq!(first.learned_for(sequence).unwrap().average_list.len(), samples);
        }
    }

    #[tokio::test]
    async fn test_unknown_machine_has_no_trace() {
        let trace = bundled().load_cycle_trace("nope", AnomalyClass::Unknown).await.unwrap();
        assert!(trace.is_none());
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let store = JsonFixtureStore::new("/nonexistent/fixtures");
        let err = store.load_topology().await.unwrap_err();
        assert!(err.to_string().contains("treevisual.json"));
    }
}
