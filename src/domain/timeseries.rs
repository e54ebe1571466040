// Per-cycle raw signal traces
use super::ordered_map::OrderedMap;
use serde::{Deserialize, Serialize};

/// Offset string (seconds into the cycle) to sampled value, in source order.
pub type SignalTrace = OrderedMap<f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleTrace {
    #[serde(default)]
    pub cycle_data: OrderedMap<SignalTrace>,
}

/// Response of the time-series endpoint, keyed by cycle log id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesData {
    #[serde(default)]
    pub data: OrderedMap<CycleTrace>,
}

/// Actual and ideal traces for one drilled-down cycle.
///
/// `actual` and `ideal` come from independent sources and are only aligned
/// by index; nothing reconciles them by time value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormattedTimeSeries {
    pub time: Vec<f64>,
    pub actual: Vec<f64>,
    pub ideal: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    pub time: f64,
    pub actual: Option<f64>,
    pub ideal: Option<f64>,
}

impl FormattedTimeSeries {
    /// Chart rows zipped by index over `time`.
    pub fn rows(&self) -> Vec<TimeSeriesRow> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, &time)| TimeSeriesRow {
                time,
                actual: self.actual.get(i).copied(),
                ideal: self.ideal.get(i).copied(),
            })
            .collect()
    }

    pub fn is_index_aligned(&self) -> bool {
        self.time.len() == self.actual.len() && self.actual.len() == self.ideal.len()
    }
}
