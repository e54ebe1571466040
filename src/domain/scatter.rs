// Scatter plot series consumed by the charting layer
use super::prediction::AnomalyClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One plotted cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisValue {
    /// Epoch milliseconds.
    pub x: i64,
    pub y: f64,
    pub id: String,
    pub cycle_log_id: i64,
    pub anomaly: AnomalyClass,
    #[serde(with = "super::time::iso")]
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPlotData {
    pub anomaly_true_data: Vec<AxisValue>,
    pub anomaly_false_data: Vec<AxisValue>,
    pub anomaly_null_data: Vec<AxisValue>,
}

impl ScatterPlotData {
    pub fn push(&mut self, point: AxisValue) {
        match point.anomaly {
            AnomalyClass::Anomaly => self.anomaly_true_data.push(point),
            AnomalyClass::NoAnomaly => self.anomaly_false_data.push(point),
            AnomalyClass::Unknown => self.anomaly_null_data.push(point),
        }
    }

    pub fn len(&self) -> usize {
        self.anomaly_true_data.len() + self.anomaly_false_data.len() + self.anomaly_null_data.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Horizontal threshold segment over one calibration's validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSegment {
    pub x1: i64,
    pub x2: i64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOption {
    pub id: Option<i64>,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPlot {
    pub x_ticks: Vec<i64>,
    pub scatter_plot_data: ScatterPlotData,
    pub thresholds: Vec<ThresholdSegment>,
    pub machine_id: String,
    pub signal: String,
    pub sequence: String,
    pub tool_options: Vec<ToolOption>,
    pub unprocessed_sequences: BTreeMap<String, u64>,
}
