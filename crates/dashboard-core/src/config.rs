//! Overview dashboard configuration

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use crate::error::{DashboardError, Result};
use crate::layout::{Direction, Section, SectionLayout};

pub const MIN_REFRESH_SECS: u64 = 5;
pub const MAX_REFRESH_SECS: u64 = 300;
pub const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    pub refresh_interval_secs: u64,
    pub auto_refresh: bool,
    pub layout: SectionLayout,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            auto_refresh: true,
            layout: SectionLayout::overview(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_REFRESH_SECS..=MAX_REFRESH_SECS).contains(&self.refresh_interval_secs) {
            return Err(DashboardError::InvalidConfig(format!(
                "refresh interval must be between {} and {} seconds, got {}",
                MIN_REFRESH_SECS, MAX_REFRESH_SECS, self.refresh_interval_secs
            )));
        }
        self.layout.check_unique()
    }

    /// Refresh period, clamped into the supported range
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS),
        )
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            interval: self.refresh_interval(),
            auto_refresh: self.auto_refresh,
        }
    }
}

/// The part of the configuration a refresh loop follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub interval: Duration,
    pub auto_refresh: bool,
}

/// Shared, mutable dashboard configuration.
///
/// Refresh changes are also published on a watch channel so running
/// refresh loops pick them up without a restart.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    inner: Arc<RwLock<DashboardConfig>>,
    refresh: Arc<watch::Sender<RefreshSettings>>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from_valid(DashboardConfig::default())
    }
}

impl DashboardSettings {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: DashboardConfig) -> Self {
        let (refresh, _) = watch::channel(config.refresh_settings());
        Self {
            inner: Arc::new(RwLock::new(config)),
            refresh: Arc::new(refresh),
        }
    }

    /// Receiver that observes every refresh interval or auto-refresh change
    pub fn watch_refresh(&self) -> watch::Receiver<RefreshSettings> {
        self.refresh.subscribe()
    }

    pub fn get(&self) -> DashboardConfig {
        self.inner.read().clone()
    }

    /// Replace the configuration; an installed layout callback is kept
    pub fn update(&self, mut config: DashboardConfig) -> Result<DashboardConfig> {
        config.validate()?;
        let mut current = self.inner.write();
        let callback = current.layout.take_callback();
        config.layout.set_callback(callback);
        *current = config;
        info!(
            "Dashboard config updated (refresh {}s, auto {})",
            current.refresh_interval_secs, current.auto_refresh
        );
        let next = current.refresh_settings();
        self.refresh.send_if_modified(|published| {
            let changed = *published != next;
            *published = next;
            changed
        });
        Ok(current.clone())
    }

    /// Register a callback for layout changes made through these settings.
    ///
    /// The callback runs under the settings lock and must not call back into them.
    pub fn on_layout_change(&self, callback: impl Fn(&[Section]) + Send + Sync + 'static) {
        self.inner.write().layout.on_change(callback);
    }

    pub fn move_section(&self, id: &str, direction: Direction) -> Result<SectionLayout> {
        let mut config = self.inner.write();
        config.layout.move_section(id, direction)?;
        Ok(config.layout.clone())
    }

    pub fn set_section_visible(&self, id: &str, visible: bool) -> Result<SectionLayout> {
        let mut config = self.inner.write();
        config.layout.set_visible(id, visible)?;
        Ok(config.layout.clone())
    }
}
