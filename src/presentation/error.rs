// Mapping of pipeline errors onto the {Status, Error} envelope
use crate::application::error::{ApiError, DrilldownError, SearchError, TopologyError};
use crate::infrastructure::http_response::error_response;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub async fn into_envelope(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self.message);
        } else {
            tracing::debug!("Rejected request: {}", self.message);
        }
        match error_response(self.status, &self.message).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(m) | ApiError::NotFound(m) => AppError::bad_request(m),
            ApiError::Fixture(m) | ApiError::Transport(m) => AppError::internal(m),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Api(api) => api.into(),
            other => AppError::bad_request(other.to_string()),
        }
    }
}

impl From<DrilldownError> for AppError {
    fn from(err: DrilldownError) -> Self {
        match err {
            DrilldownError::Api(api) => api.into(),
            other => AppError::bad_request(other.to_string()),
        }
    }
}

impl From<TopologyError> for AppError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::Api(api) => api.into(),
            TopologyError::NotLoaded => AppError::internal(err.to_string()),
            TopologyError::UnknownMachine(_) => AppError::bad_request(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation: AppError = ApiError::Validation("machine_id is required".to_string()).into();
        let fixture: AppError = ApiError::Fixture("Failed to load graph visualization data".to_string()).into();
        let unknown: AppError = TopologyError::UnknownMachine(7).into();
        let no_selection: AppError = DrilldownError::NoSelection.into();

        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(fixture.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
        assert_eq!(no_selection.message, "no search has completed yet");
    }
}
