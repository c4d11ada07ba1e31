//! # MediNet Dispatch-Core
//!
//! Ambulance dispatch lifecycle for the MediNet hospital network console.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     DispatchEngine                       │
//! ├──────────────┬──────────────┬──────────────┬─────────────┤
//! │  Ambulance   │   Request    │    Route     │  Hospital   │
//! │  Registry    │   Queue      │   Tracker    │  Directory  │
//! ├──────────────┴──────┬───────┴──────────────┴─────────────┤
//! │ DispatchCoordinator │ StatusUpdater │ RoutePlanner       │
//! ├─────────────────────┴───────────────┴────────────────────┤
//! │         DispatchStore (in-memory │ SQLite)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Leaves first: registry → queue → route tracker → coordinator/status
//! updater. The coordinator turns a pending request plus an available
//! ambulance into a route; the status updater walks routes through
//! `planned → in_progress → completed | cancelled` and hands the ambulance
//! back to the pool on terminal transitions.
//!
//! ## Invariants
//!
//! - An ambulance has at most one active (`planned`/`in_progress`) route.
//!   Dispatch reserves the ambulance with a conditional
//!   `available → dispatched` write, so two concurrent dispatches of the
//!   same ambulance produce exactly one route.
//! - A request is dispatched at most once (conditional
//!   `pending → dispatched` write).
//! - Terminal routes never change again.
//!
//! ## Quick Start
//!
//! ```rust
//! use medinet_dispatch_core::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = DispatchEngine::in_memory(DispatchConfig::default());
//!
//! let general = engine.hospitals().add(NewHospital {
//!     name: "General".to_string(),
//!     address: "1 Main St".to_string(),
//!     coordinates: Coordinates::new(40.71, -74.00),
//! }).await?;
//!
//! let ambulance = engine.registry().register(&general.id, NewAmbulance {
//!     vehicle_id: "AMB-01".to_string(),
//!     plate_number: "NY-1234".to_string(),
//!     kind: AmbulanceType::Advanced,
//! }).await?;
//! # let _ = ambulance;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod events;
pub mod hospitals;
pub mod intake;
pub mod planner;
pub mod queue;
pub mod registry;
pub mod routes;
pub mod status;
pub mod store;
pub mod types;

pub use config::DispatchConfig;
pub use coordinator::DispatchCoordinator;
pub use engine::DispatchEngine;
pub use error::{DispatchError, Result};
pub use events::DispatchEvent;
pub use hospitals::HospitalDirectory;
pub use intake::{FieldErrors, IntakeStep, RequestForm};
pub use planner::{DirectRoutePlanner, RouteLeg, RoutePlan, RoutePlanner};
pub use queue::RequestQueue;
pub use registry::AmbulanceRegistry;
pub use routes::RouteTracker;
pub use status::StatusUpdater;
pub use store::{DispatchStore, InMemoryDispatchStore, SqliteDispatchStore};

/// Commonly used types
pub mod prelude {
    pub use crate::config::DispatchConfig;
    pub use crate::engine::DispatchEngine;
    pub use crate::error::{DispatchError, Result};
    pub use crate::events::DispatchEvent;
    pub use crate::intake::{IntakeStep, RequestForm};
    pub use crate::types::*;
}
