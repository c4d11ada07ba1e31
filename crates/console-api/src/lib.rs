//! # MediNet Console API
//!
//! The JSON HTTP surface of the MediNet hospital network console, wiring
//! together dispatch, alerts and the overview dashboard.
//!
//! ```text
//!   axum router ──► ConsoleState ──┬─► DispatchEngine   (medinet-dispatch-core)
//!                                  ├─► AlertService     (medinet-alerts-core)
//!                                  └─► DashboardSettings (medinet-dashboard-core)
//! ```
//!
//! [`ConsoleServer`] binds the router, and while running logs an overview
//! line at the dashboard refresh interval. Configuration comes from
//! [`ConsoleConfig::load`].
//!
//! ```no_run
//! use medinet_console_api::{ConsoleConfig, ConsoleServer};
//!
//! # async fn example() -> medinet_console_api::ConsoleResult<()> {
//! let mut server = ConsoleServer::new(ConsoleConfig::load(None)?).await?;
//! let addr = server.start().await?;
//! println!("listening on {}", addr);
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use api::router;
pub use config::ConsoleConfig;
pub use error::{ApiError, ApiResult, ConsoleError, ConsoleResult};
pub use server::ConsoleServer;
pub use state::ConsoleState;
