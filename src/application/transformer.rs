// Prediction/changelog transformer - Raw records to chart series
use crate::application::error::TransformError;
use crate::domain::changelog::ChangeLogEntry;
use crate::domain::prediction::{PredictionData, parse_epoch_key};
use crate::domain::scatter::{AxisValue, ScatterPlot, ScatterPlotData, ThresholdSegment, ToolOption};
use crate::domain::time::generate_x_axis_ticks;
use chrono::NaiveDate;

/// Partition a machine's cycles into anomaly/no-anomaly/unknown points for
/// one signal.
///
/// Cycles without the signal produce no point. Output keeps the cycles'
/// source order; nothing here sorts by `x`.
pub fn format_prediction_data(prediction: Option<&PredictionData>, signal: &str) -> ScatterPlotData {
    let mut scatter = ScatterPlotData::default();
    let Some(prediction) = prediction else {
        return scatter;
    };

    for (epoch_key, cycle) in prediction.cycles.iter() {
        let Some(signal_data) = cycle.data.get(signal) else {
            continue;
        };
        let Some(epoch) = parse_epoch_key(epoch_key) else {
            tracing::warn!("Skipping cycle {} with non-numeric epoch key '{}'", cycle.id, epoch_key);
            continue;
        };
        let Some(x) = epoch.checked_mul(1000) else {
            tracing::warn!("Skipping cycle {} with out-of-range epoch key '{}'", cycle.id, epoch_key);
            continue;
        };

        scatter.push(AxisValue {
            x,
            y: signal_data.distance,
            id: cycle.id.clone(),
            cycle_log_id: cycle.cycle_log_id,
            anomaly: signal_data.class(),
            start_time: cycle.start_time,
        });
    }

    scatter
}

/// One threshold segment per changelog entry for the given tool sequence.
pub fn threshold_segments(
    changelogs: &[ChangeLogEntry],
    sequence: &str,
) -> Result<Vec<ThresholdSegment>, TransformError> {
    changelogs
        .iter()
        .map(|log| {
            let learned = log.learned_for(sequence).ok_or_else(|| TransformError::MissingSequence {
                changelog_id: log.id.clone(),
                sequence: sequence.to_string(),
            })?;

            Ok(ThresholdSegment {
                x1: log.start_time.timestamp_millis(),
                x2: log.end_time.timestamp_millis(),
                y: learned.threshold,
            })
        })
        .collect()
}

/// Tool choices offered for a machine. All entries of a machine share the
/// same tool map, so the first one is representative.
pub fn tool_options(changelogs: &[ChangeLogEntry]) -> Vec<ToolOption> {
    let Some(first) = changelogs.first() else {
        return Vec::new();
    };

    first
        .config_parameters
        .tool_sequence_map
        .iter()
        .map(|(sequence, tool)| ToolOption {
            id: *tool,
            label: tool.map(|t| t.to_string()).unwrap_or_else(|| sequence.to_string()),
            value: sequence.to_string(),
        })
        .collect()
}

/// First signal of the first calibration entry.
pub fn default_signal(changelogs: &[ChangeLogEntry], machine_id: &str) -> Result<String, TransformError> {
    let first = changelogs
        .first()
        .ok_or_else(|| TransformError::NoChangeLog(machine_id.to_string()))?;

    first
        .config_parameters
        .signals
        .first()
        .cloned()
        .ok_or_else(|| TransformError::NoSignal(first.id.clone()))
}

/// What a completed search asked for.
pub struct PlotContext<'a> {
    pub machine_id: &'a str,
    pub signal: &'a str,
    pub tool_sequence: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Everything the scatter chart needs for one search.
pub fn build_scatter_plot(
    context: &PlotContext<'_>,
    changelogs: &[ChangeLogEntry],
    prediction: Option<&PredictionData>,
) -> Result<ScatterPlot, TransformError> {
    Ok(ScatterPlot {
        x_ticks: generate_x_axis_ticks(context.start_date, context.end_date),
        scatter_plot_data: format_prediction_data(prediction, context.signal),
        thresholds: threshold_segments(changelogs, context.tool_sequence)?,
        machine_id: context.machine_id.to_string(),
        signal: context.signal.to_string(),
        sequence: context.tool_sequence.to_string(),
        tool_options: tool_options(changelogs),
        unprocessed_sequences: prediction.map(|p| p.unprocessed_sequences.clone()).unwrap_or_default(),
    })
}
