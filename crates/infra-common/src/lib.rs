//! # MediNet Infra-Common
//!
//! Shared plumbing for the MediNet console backend crates:
//!
//! - [`logging`]: subscriber setup and component/operation log context
//! - [`errors`]: the infrastructure error type
//! - [`events`]: a typed broadcast event bus used for change notifications
//! - [`tasks`]: background tasks that are cancelled when their handle drops

pub mod errors;
pub mod events;
pub mod logging;
pub mod tasks;

pub use errors::types::{InfraError, Result};
pub use events::bus::{EventBus, EventSubscription};
pub use logging::setup::{setup_logging, LoggingConfig};
pub use logging::context::LogContext;
pub use tasks::ManagedTask;
