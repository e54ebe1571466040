// Dashboard session - Explicit state container for search and drill-down
use crate::application::dashboard_api::{ChangeLogQuery, DashboardApi, PredictionQuery};
use crate::application::drilldown::{DrilldownResolver, PointSelection, SelectionSnapshot};
use crate::application::error::{ApiError, DrilldownError, SearchError};
use crate::application::transformer::{PlotContext, build_scatter_plot, default_signal, tool_options};
use crate::domain::scatter::{ScatterPlot, ToolOption};
use crate::domain::time::{combine_date_and_time, format_query_timestamp};
use crate::domain::timeseries::FormattedTimeSeries;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Filter controls as submitted by the search form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    pub machine_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub tool_sequence: Option<String>,
    /// Defaults to the first signal of the machine's first calibration.
    pub signal: Option<String>,
}

struct SearchFilter {
    machine_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    from_time: String,
    to_time: String,
    tool_sequence: String,
    signal: Option<String>,
}

impl SearchRequest {
    fn validate(self) -> Result<SearchFilter, SearchError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (
            Some(machine_id),
            Some(start_date),
            Some(start_time),
            Some(end_date),
            Some(end_time),
            Some(tool_sequence),
        ) = (
            non_empty(self.machine_id),
            self.start_date,
            self.start_time,
            self.end_date,
            self.end_time,
            non_empty(self.tool_sequence),
        )
        else {
            return Err(SearchError::InvalidFilter(
                "machine, start/end date and time, and tool are required".to_string(),
            ));
        };

        let from = combine_date_and_time(start_date, start_time);
        let to = combine_date_and_time(end_date, end_time);
        if to < from {
            return Err(SearchError::InvalidFilter("end must not be before start".to_string()));
        }

        Ok(SearchFilter {
            machine_id,
            start_date,
            end_date,
            from_time: format_query_timestamp(from),
            to_time: format_query_timestamp(to),
            tool_sequence,
            signal: non_empty(self.signal),
        })
    }
}

#[derive(Debug, Default)]
struct SessionState {
    snapshot: Option<SelectionSnapshot>,
    scatter_plot: Option<ScatterPlot>,
    time_series: Option<FormattedTimeSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub loading: bool,
    pub machine_id: Option<String>,
    pub tool_sequence: Option<String>,
    pub signal: Option<String>,
    pub change_log_count: usize,
    pub scatter_plot: Option<ScatterPlot>,
    pub time_series: Option<FormattedTimeSeries>,
}

/// Clears the loading flag on every exit path.
struct LoadingGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct DashboardSession {
    api: Arc<dyn DashboardApi>,
    state: Arc<RwLock<SessionState>>,
    loading: Arc<AtomicBool>,
}

impl DashboardSession {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(SessionState::default())),
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    fn begin_loading(&self) -> LoadingGuard {
        self.loading.store(true, Ordering::SeqCst);
        LoadingGuard {
            flag: self.loading.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Tool choices for a machine and window.
    pub async fn tool_options(&self, query: &ChangeLogQuery) -> Result<Vec<ToolOption>, ApiError> {
        let changelogs = self.api.changelogs(query).await?;
        Ok(tool_options(&changelogs))
    }

    /// Run a search and remember its context for later drill-downs.
    ///
    /// Overlapping searches are not cancelled; whichever finishes last wins.
    pub async fn search(&self, request: SearchRequest) -> Result<ScatterPlot, SearchError> {
        let filter = request.validate()?;
        let _loading = self.begin_loading();

        let changelog_query = ChangeLogQuery {
            machine_id: Some(filter.machine_id.clone()),
            from_time: Some(filter.from_time.clone()),
            to_time: Some(filter.to_time.clone()),
            limit: None,
        };
        let prediction_query = PredictionQuery {
            machine_id: Some(filter.machine_id.clone()),
            from_time: Some(filter.from_time.clone()),
            to_time: Some(filter.to_time.clone()),
        };

        let (changelogs, predictions) = futures::future::join(
            self.api.changelogs(&changelog_query),
            self.api.predictions(&prediction_query),
        )
        .await;

        let changelogs = changelogs?;
        let predictions = match predictions {
            Ok(p) => Some(p),
            Err(e) if e.is_unavailable() => {
                tracing::warn!("Predictions unavailable for {}: {}", filter.machine_id, e);
                None
            }
            Err(e) => return Err(e.into()),
        };

        let signal = match filter.signal {
            Some(signal) => signal,
            None => default_signal(&changelogs, &filter.machine_id)?,
        };
        let plot = build_scatter_plot(
            &PlotContext {
                machine_id: &filter.machine_id,
                signal: &signal,
                tool_sequence: &filter.tool_sequence,
                start_date: filter.start_date,
                end_date: filter.end_date,
            },
            &changelogs,
            predictions.as_ref(),
        )?;

        tracing::info!(
            "Search for {} [{} .. {}] on '{}': {} points, {} thresholds",
            filter.machine_id,
            filter.from_time,
            filter.to_time,
            signal,
            plot.scatter_plot_data.len(),
            plot.thresholds.len()
        );

        let mut state = self.state.write().await;
        state.snapshot = Some(SelectionSnapshot {
            tool_sequence: filter.tool_sequence,
            machine_id: filter.machine_id,
            signal,
            change_logs: changelogs,
        });
        state.scatter_plot = Some(plot.clone());
        state.time_series = None;

        Ok(plot)
    }

    /// Resolve the clicked point against the last completed search.
    pub async fn drill_down(&self, point: PointSelection) -> Result<FormattedTimeSeries, DrilldownError> {
        let snapshot = self
            .state
            .read()
            .await
            .snapshot
            .clone()
            .ok_or(DrilldownError::NoSelection)?;

        let series = {
            let _loading = self.begin_loading();
            DrilldownResolver::new(self.api.as_ref()).resolve(&snapshot, &point).await
        };

        match series {
            Ok(series) => {
                self.state.write().await.time_series = Some(series.clone());
                Ok(series)
            }
            Err(e) => {
                tracing::warn!("Drill-down for cycle {} failed: {}", point.cycle_log_id, e);
                Err(e)
            }
        }
    }

    pub async fn view(&self) -> SessionView {
        let state = self.state.read().await;
        let snapshot = state.snapshot.as_ref();
        SessionView {
            loading: self.is_loading(),
            machine_id: snapshot.map(|s| s.machine_id.clone()),
            tool_sequence: snapshot.map(|s| s.tool_sequence.clone()),
            signal: snapshot.map(|s| s.signal.clone()),
            change_log_count: snapshot.map_or(0, |s| s.change_logs.len()),
            scatter_plot: state.scatter_plot.clone(),
            time_series: state.time_series.clone(),
        }
    }
}
