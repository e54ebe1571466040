// Error taxonomy for the data service and the transformation pipeline
use thiserror::Error;

/// Failures crossing the mock HTTP boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Missing or malformed query parameters.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// A fixture could not be read or parsed.
    #[error("{0}")]
    Fixture(String),

    /// The remote backend could not be reached or answered garbage.
    #[error("{0}")]
    Transport(String),
}

impl ApiError {
    /// Transport and fixture failures mean "no data", not "bad request".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::Fixture(_) | ApiError::Transport(_))
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    #[error("changelog {changelog_id} has no learned parameters for tool sequence '{sequence}'")]
    MissingSequence { changelog_id: String, sequence: String },

    #[error("no changelog found for machine {0} in the selected window")]
    NoChangeLog(String),

    #[error("changelog {0} lists no signals")]
    NoSignal(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DrilldownError {
    #[error("no search has completed yet")]
    NoSelection,

    #[error("time series response has no {level} for {key}")]
    MissingTrace { level: &'static str, key: String },

    #[error("time offset '{0}' is not numeric")]
    InvalidOffset(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TopologyError {
    #[error("topology is not loaded")]
    NotLoaded,

    #[error("no station with machine id {0}")]
    UnknownMachine(i64),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    #[error("{0}")]
    InvalidFilter(String),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
