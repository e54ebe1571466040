// Calibration changelog domain model
use super::ordered_map::OrderedMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub window: f64,
    pub max_points: u32,
    pub min_points: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigParameters {
    /// Tool-sequence key to tool number, in source order.
    #[serde(default)]
    pub tool_sequence_map: OrderedMap<Option<i64>>,
    #[serde(default)]
    pub sequence: BTreeMap<String, Option<SequenceConfig>>,
    #[serde(default)]
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedSequence {
    pub threshold: f64,
    #[serde(default)]
    pub average_list: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: String,
    pub machine_id: String,
    #[serde(with = "super::time::iso")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "super::time::iso")]
    pub end_time: DateTime<Utc>,
    #[serde(with = "super::time::iso")]
    pub learned_time: DateTime<Utc>,
    #[serde(default)]
    pub config_parameters: ConfigParameters,
    #[serde(default)]
    pub learned_parameters: BTreeMap<String, Option<LearnedSequence>>,
}

impl ChangeLogEntry {
    /// Learned parameters for one tool sequence, if this calibration has them.
    pub fn learned_for(&self, sequence: &str) -> Option<&LearnedSequence> {
        self.learned_parameters.get(sequence).and_then(Option::as_ref)
    }

    /// Inclusive on both ends.
    pub fn covers(&self, timestamp: DateTime<Utc>) -> bool {
        self.start_time <= timestamp && timestamp <= self.end_time
    }

    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start_time <= to && from <= self.end_time
    }
}
