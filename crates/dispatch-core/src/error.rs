//! Error types for dispatch operations

use thiserror::Error;

use crate::intake::FieldErrors;
use crate::types::AmbulanceStatus;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Hospital not found: {0}")]
    HospitalNotFound(String),

    #[error("Ambulance not found: {0}")]
    AmbulanceNotFound(String),

    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Ambulance {ambulance_id} is not available (status: {status})")]
    AmbulanceUnavailable {
        ambulance_id: String,
        status: AmbulanceStatus,
    },

    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Route planning failed: {0}")]
    Planner(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DispatchError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::HospitalNotFound(_)
                | Self::AmbulanceNotFound(_)
                | Self::RequestNotFound(_)
                | Self::RouteNotFound(_)
        )
    }
}

impl From<sqlx::Error> for DispatchError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Storage(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("Serialization error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
