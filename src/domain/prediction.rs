// Cycle prediction domain model
use super::ordered_map::OrderedMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Three-way anomaly verdict for one cycle/signal pair.
///
/// On the wire the verdict is `true | false | null`; in chart payloads it is
/// carried as the marker color (`red | green | black`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyClass {
    #[serde(rename = "red")]
    Anomaly,
    #[serde(rename = "green")]
    NoAnomaly,
    #[serde(rename = "black")]
    Unknown,
}

impl AnomalyClass {
    pub fn from_verdict(verdict: Option<bool>) -> Self {
        match verdict {
            Some(true) => AnomalyClass::Anomaly,
            Some(false) => AnomalyClass::NoAnomaly,
            None => AnomalyClass::Unknown,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AnomalyClass::Anomaly => "red",
            AnomalyClass::NoAnomaly => "green",
            AnomalyClass::Unknown => "black",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAnomalyClass(pub String);

impl FromStr for AnomalyClass {
    type Err = UnknownAnomalyClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "red" | "anomaly" => Ok(AnomalyClass::Anomaly),
            "false" | "green" | "noanomaly" | "no_anomaly" => Ok(AnomalyClass::NoAnomaly),
            "null" | "black" | "unknown" => Ok(AnomalyClass::Unknown),
            _ => Err(UnknownAnomalyClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalData {
    pub distance: f64,
    pub anomaly: Option<bool>,
}

impl SignalData {
    pub fn class(&self) -> AnomalyClass {
        AnomalyClass::from_verdict(self.anomaly)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleData {
    pub id: String,
    pub cycle_log_id: i64,
    #[serde(with = "super::time::iso")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub data: BTreeMap<String, SignalData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionData {
    pub machine_id: String,
    #[serde(with = "super::time::iso")]
    pub last_synced_time: DateTime<Utc>,
    #[serde(default)]
    pub unprocessed_sequences: BTreeMap<String, u64>,
    #[serde(with = "super::time::iso")]
    pub from_time: DateTime<Utc>,
    #[serde(with = "super::time::iso")]
    pub to_time: DateTime<Utc>,
    /// Epoch-second string to cycle, in source order.
    #[serde(default)]
    pub cycles: OrderedMap<CycleData>,
}

/// Parse an epoch-seconds cycle key.
pub fn parse_epoch_key(key: &str) -> Option<i64> {
    key.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_mapping() {
        assert_eq!(AnomalyClass::from_verdict(Some(true)), AnomalyClass::Anomaly);
        assert_eq!(AnomalyClass::from_verdict(Some(false)), AnomalyClass::NoAnomaly);
        assert_eq!(AnomalyClass::from_verdict(None), AnomalyClass::Unknown);
    }

    #[test]
    fn test_parse_accepts_verdicts_and_colors() {
        assert_eq!("true".parse(), Ok(AnomalyClass::Anomaly));
        assert_eq!("Green".parse(), Ok(AnomalyClass::NoAnomaly));
        assert_eq!("null".parse(), Ok(AnomalyClass::Unknown));
        assert!("purple".parse::<AnomalyClass>().is_err());
    }

    #[test]
    fn test_class_serializes_as_color() {
        assert_eq!(serde_json::to_string(&AnomalyClass::Unknown).unwrap(), "\"black\"");
    }

    #[test]
    fn test_null_anomaly_is_kept_distinct() {
        let json = r#"{"id": "c1", "cycle_log_id": 5, "start_time": "2023-11-14T22:13:20Z",
                       "data": {"sig1": {"distance": 12.5, "anomaly": null}}}"#;
        let cycle: CycleData = serde_json::from_str(json).unwrap();

        assert_eq!(cycle.data["sig1"].class(), AnomalyClass::Unknown);
    }
}
