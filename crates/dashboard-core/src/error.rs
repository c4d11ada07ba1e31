//! Error types for dashboard-core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Duplicate section id: {0}")]
    DuplicateSection(String),

    #[error("Invalid dashboard configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot failed: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
