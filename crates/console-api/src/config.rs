//! Console configuration.
//!
//! Layered from built-in defaults, an optional TOML file and `MEDINET__*`
//! environment variables, in that order. Nested keys use `__` in the
//! environment, e.g. `MEDINET__SERVER__BIND_ADDRESS=0.0.0.0:9000`.

use config::{Config, Environment, File};
use medinet_dashboard_core::{DashboardConfig, SectionLayout};
use medinet_dispatch_core::DispatchConfig;
use medinet_infra_common::logging::setup::parse_log_level;
use medinet_infra_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

use crate::error::{ConsoleError, ConsoleResult};

pub const ENV_PREFIX: &str = "MEDINET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub dashboard: DashboardSection,
    pub dispatch: DispatchConfig,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Grace period for in-flight requests on stop
    pub shutdown_timeout_secs: u64,
    /// Log an overview line at the dashboard refresh interval, while the
    /// dashboard's auto refresh is on
    pub log_overview: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            shutdown_timeout_secs: 5,
            log_overview: true,
        }
    }
}

/// Dispatch storage; no URL means an in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSection {
    pub refresh_interval_secs: u64,
    pub auto_refresh: bool,
}

impl Default for DashboardSection {
    fn default() -> Self {
        let defaults = DashboardConfig::default();
        Self {
            refresh_interval_secs: defaults.refresh_interval_secs,
            auto_refresh: defaults.auto_refresh,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
    /// Log span enter/exit, e.g. around each dispatch
    pub spans: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
            spans: false,
        }
    }
}

impl ConsoleConfig {
    /// Defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> ConsoleResult<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&ConsoleConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: ConsoleConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConsoleResult<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| {
                ConsoleError::InvalidConfig(format!(
                    "server.bind_address '{}': {}",
                    self.server.bind_address, e
                ))
            })?;
        self.dispatch.validate()?;
        self.dashboard_config().validate()?;
        self.logging_level()?;
        Ok(())
    }

    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            refresh_interval_secs: self.dashboard.refresh_interval_secs,
            auto_refresh: self.dashboard.auto_refresh,
            layout: SectionLayout::overview(),
        }
    }

    pub fn logging_config(&self) -> ConsoleResult<LoggingConfig> {
        let mut logging = LoggingConfig::new(self.logging_level()?, "medinet-console");
        if self.logging.json {
            logging = logging.with_json();
        }
        if self.logging.file_info {
            logging = logging.with_file_info();
        }
        if self.logging.spans {
            logging = logging.with_spans();
        }
        Ok(logging)
    }

    fn logging_level(&self) -> ConsoleResult<Level> {
        parse_log_level(&self.logging.level)
            .map_err(|e| ConsoleError::InvalidConfig(format!("logging.level: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn defaults_are_valid() {
        let config = ConsoleConfig::load(None).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert!(config.database.url.is_none());
        assert_eq!(config.dashboard.refresh_interval_secs, 30);
        assert_eq!(config.dispatch.average_speed_kmh, 60.0);
    }

    #[test]
    #[serial]
    fn file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nbind_address = \"0.0.0.0:9000\"\n\n[dashboard]\nrefresh_interval_secs = 60\n"
        )
        .unwrap();

        std::env::set_var("MEDINET__DASHBOARD__REFRESH_INTERVAL_SECS", "120");
        let loaded = ConsoleConfig::load(Some(file.path()));
        std::env::remove_var("MEDINET__DASHBOARD__REFRESH_INTERVAL_SECS");

        let config = loaded.unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.dashboard.refresh_interval_secs, 120);
    }

    #[test]
    #[serial]
    fn out_of_range_refresh_is_rejected() {
        std::env::set_var("MEDINET__DASHBOARD__REFRESH_INTERVAL_SECS", "2");
        let loaded = ConsoleConfig::load(None);
        std::env::remove_var("MEDINET__DASHBOARD__REFRESH_INTERVAL_SECS");
        assert!(matches!(loaded, Err(ConsoleError::Dashboard(_))));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = ConsoleConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.logging_config(),
            Err(ConsoleError::InvalidConfig(_))
        ));
    }
}
