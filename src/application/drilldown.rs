// Cycle drill-down resolver - Actual vs ideal trace for one clicked point
use crate::application::dashboard_api::{DashboardApi, TimeSeriesQuery};
use crate::application::error::DrilldownError;
use crate::domain::changelog::ChangeLogEntry;
use crate::domain::prediction::AnomalyClass;
use crate::domain::timeseries::{FormattedTimeSeries, TimeSeriesData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The clicked scatter point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSelection {
    pub cycle_log_id: i64,
    pub anomaly: AnomalyClass,
    #[serde(with = "crate::domain::time::iso")]
    pub start_time: DateTime<Utc>,
}

/// Context captured when a search completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub tool_sequence: String,
    pub machine_id: String,
    pub signal: String,
    pub change_logs: Vec<ChangeLogEntry>,
}

/// Learned average trace of the first calibration whose window contains
/// `start_time`. Empty when no window matches or the sequence is absent.
pub fn find_ideal_trace(changelogs: &[ChangeLogEntry], start_time: DateTime<Utc>, tool_sequence: &str) -> Vec<f64> {
    changelogs
        .iter()
        .find(|log| log.covers(start_time))
        .and_then(|log| log.learned_for(tool_sequence))
        .map(|learned| learned.average_list.clone())
        .unwrap_or_default()
}

/// Pull `data[cycle_log_id].cycle_data[signal]` into parallel time/value vectors.
pub fn extract_actual_trace(
    response: &TimeSeriesData,
    cycle_log_id: &str,
    signal: &str,
) -> Result<(Vec<f64>, Vec<f64>), DrilldownError> {
    let cycle = response.data.get(cycle_log_id).ok_or_else(|| DrilldownError::MissingTrace {
        level: "cycle",
        key: cycle_log_id.to_string(),
    })?;
    let trace = cycle.cycle_data.get(signal).ok_or_else(|| DrilldownError::MissingTrace {
        level: "signal",
        key: signal.to_string(),
    })?;

    let mut time = Vec::with_capacity(trace.len());
    let mut actual = Vec::with_capacity(trace.len());
    for (offset, value) in trace.iter() {
        let t = offset
            .trim()
            .parse::<f64>()
            .map_err(|_| DrilldownError::InvalidOffset(offset.to_string()))?;
        time.push(t);
        actual.push(*value);
    }

    Ok((time, actual))
}

#[derive(Clone, Copy)]
pub struct DrilldownResolver<'a> {
    api: &'a dyn DashboardApi,
}

impl<'a> DrilldownResolver<'a> {
    pub fn new(api: &'a dyn DashboardApi) -> Self {
        Self { api }
    }

    pub async fn resolve(
        &self,
        snapshot: &SelectionSnapshot,
        point: &PointSelection,
    ) -> Result<FormattedTimeSeries, DrilldownError> {
        let ideal = find_ideal_trace(&snapshot.change_logs, point.start_time, &snapshot.tool_sequence);
        if ideal.is_empty() {
            tracing::debug!(
                "No calibration window covers cycle {} at {}",
                point.cycle_log_id,
                point.start_time
            );
        }

        let cycle_log_id = point.cycle_log_id.to_string();
        let query = TimeSeriesQuery {
            machine_id: Some(snapshot.machine_id.clone()),
            cycle_log_id: Some(cycle_log_id.clone()),
            signal: Some(snapshot.signal.clone()),
            anomaly: Some(point.anomaly.color().to_string()),
        };

        let response = self.api.timeseries(&query).await?;
        let (time, actual) = extract_actual_trace(&response, &cycle_log_id, &snapshot.signal)?;

        let series = FormattedTimeSeries { time, actual, ideal };
        if !series.is_index_aligned() {
            tracing::warn!(
                "Cycle {} has {} actual samples but {} ideal samples; rows align by index only",
                cycle_log_id,
                series.actual.len(),
                series.ideal.len()
            );
        }

        Ok(series)
    }
}
