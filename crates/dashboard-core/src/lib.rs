//! # MediNet Dashboard-Core
//!
//! State behind the console overview page:
//!
//! - [`layout`]: the ordered list of overview sections and their visibility
//! - [`config`]: refresh interval, auto-refresh flag and the shared settings handle
//! - [`snapshot`]: the network-wide counters and the [`SnapshotSource`] seam
//!   through which the console assembles them
//! - [`refresh`]: periodic snapshots delivered as a cancellable stream
//!
//! ```
//! use medinet_dashboard_core::{Direction, DashboardSettings};
//!
//! let settings = DashboardSettings::default();
//! let layout = settings.move_section("alerts", Direction::Up).unwrap();
//! assert_eq!(layout.ids()[3], "alerts");
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod refresh;
pub mod snapshot;

pub use config::{
    DashboardConfig, DashboardSettings, RefreshSettings, DEFAULT_REFRESH_SECS, MAX_REFRESH_SECS,
    MIN_REFRESH_SECS,
};
pub use error::{DashboardError, Result};
pub use layout::{Direction, LayoutCallback, Section, SectionLayout};
pub use refresh::{RefreshScheduler, RefreshSubscription};
pub use snapshot::{OverviewSnapshot, SnapshotSource};
