//! Error types for alerts-core

use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::Channel;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Alert template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid alert transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Validation failed: {}", format_fields(.0))]
    Validation(BTreeMap<String, Vec<String>>),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Notification over {channel} failed: {message}")]
    Notification { channel: Channel, message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AlertError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), vec![message.into()]);
        Self::Validation(fields)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AlertNotFound(_) | Self::TemplateNotFound(_))
    }
}

fn format_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<validator::ValidationErrors> for AlertError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, list)| {
                let messages = list
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self::Validation(fields)
    }
}

pub type Result<T> = std::result::Result<T, AlertError>;
