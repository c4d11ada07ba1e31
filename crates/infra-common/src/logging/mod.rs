//! Logging setup and structured log context

pub mod context;
pub mod setup;
