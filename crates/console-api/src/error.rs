//! Error types for the console: startup errors and the HTTP error response

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medinet_alerts_core::AlertError;
use medinet_dashboard_core::DashboardError;
use medinet_dispatch_core::DispatchError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors raised while configuring or running the console server
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server is not running")]
    NotRunning,
}

pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;

/// Error returned by handlers, rendered as `{"error": "<message>"}`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed with {}: {}", self.status, self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let status = match &err {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            DispatchError::AmbulanceUnavailable { .. } | DispatchError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            DispatchError::InvalidTransition { .. }
            | DispatchError::InvalidState(_)
            | DispatchError::Validation(_)
            | DispatchError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        let status = match &err {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            AlertError::InvalidTransition { .. }
            | AlertError::Validation(_)
            | AlertError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        let status = match &err {
            DashboardError::SectionNotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::DuplicateSection(_) | DashboardError::InvalidConfig(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medinet_dispatch_core::types::AmbulanceStatus;

    #[test]
    fn dispatch_errors_map_to_status_codes() {
        let cases = [
            (DispatchError::RouteNotFound("r".into()), StatusCode::NOT_FOUND),
            (
                DispatchError::AmbulanceUnavailable {
                    ambulance_id: "a".into(),
                    status: AmbulanceStatus::Dispatched,
                },
                StatusCode::CONFLICT,
            ),
            (
                DispatchError::InvalidTransition {
                    entity: "route",
                    from: "completed".into(),
                    to: "planned".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (DispatchError::storage("disk"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn alert_errors_map_to_status_codes() {
        assert_eq!(
            ApiError::from(AlertError::TemplateNotFound("t".into())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AlertError::validation("name", "required")).status,
            StatusCode::BAD_REQUEST
        );
    }
}
