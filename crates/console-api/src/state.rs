//! Shared state handed to every handler

use async_trait::async_trait;
use chrono::Utc;
use medinet_alerts_core::AlertService;
use medinet_dashboard_core::{DashboardError, DashboardSettings, OverviewSnapshot, SnapshotSource};
use medinet_dispatch_core::types::AmbulanceStatus;
use medinet_dispatch_core::{DispatchConfig, DispatchEngine};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::ConsoleConfig;
use crate::error::ConsoleResult;

#[derive(Clone)]
pub struct ConsoleState {
    pub dispatch: DispatchEngine,
    pub alerts: Arc<AlertService>,
    pub dashboard: DashboardSettings,
}

impl ConsoleState {
    pub fn new(dispatch: DispatchEngine, alerts: AlertService, dashboard: DashboardSettings) -> Self {
        Self {
            dispatch,
            alerts: Arc::new(alerts),
            dashboard,
        }
    }

    /// Everything in memory with default settings
    pub fn in_memory() -> Self {
        Self::new(
            DispatchEngine::in_memory(DispatchConfig::default()),
            AlertService::in_memory(),
            DashboardSettings::default(),
        )
    }

    /// Build from configuration, opening the database if one is configured
    pub async fn from_config(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let dispatch = match &config.database.url {
            Some(url) => DispatchEngine::sqlite(url, config.dispatch.clone()).await?,
            None => {
                config.dispatch.validate()?;
                info!("No database configured, dispatch state is kept in memory");
                DispatchEngine::in_memory(config.dispatch.clone())
            }
        };
        let dashboard = DashboardSettings::new(config.dashboard_config())?;
        Ok(Self::new(dispatch, AlertService::in_memory(), dashboard))
    }

    pub fn snapshot_source(&self) -> Arc<dyn SnapshotSource> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl SnapshotSource for ConsoleState {
    async fn snapshot(&self) -> medinet_dashboard_core::Result<OverviewSnapshot> {
        let hospitals = self.dispatch.hospitals().list().await.map_err(snapshot_error)?;
        let ambulances = self.dispatch.registry().list_all().await.map_err(snapshot_error)?;
        let pending_requests = self
            .dispatch
            .queue()
            .pending_count(None)
            .await
            .map_err(snapshot_error)?;
        let active_routes = self
            .dispatch
            .routes()
            .active_count()
            .await
            .map_err(snapshot_error)?;
        let open_alerts = self.alerts.open_counts().await.map_err(snapshot_error)?;

        let mut ambulances_by_status: BTreeMap<String, usize> = AmbulanceStatus::ALL
            .iter()
            .map(|status| (status.to_string(), 0))
            .collect();
        for ambulance in &ambulances {
            *ambulances_by_status
                .entry(ambulance.status.to_string())
                .or_default() += 1;
        }

        Ok(OverviewSnapshot {
            hospitals: hospitals.len(),
            ambulances_by_status,
            pending_requests,
            active_routes,
            open_alerts_by_priority: open_alerts
                .into_iter()
                .map(|(priority, count)| (priority.to_string(), count))
                .collect(),
            generated_at: Utc::now(),
        })
    }
}

fn snapshot_error(err: impl std::fmt::Display) -> DashboardError {
    DashboardError::Snapshot(err.to_string())
}
