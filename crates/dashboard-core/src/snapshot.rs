//! Overview snapshot and its source seam

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Network-wide counters shown on the overview page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSnapshot {
    pub hospitals: usize,
    /// Keyed by ambulance status
    pub ambulances_by_status: BTreeMap<String, usize>,
    pub pending_requests: usize,
    pub active_routes: usize,
    /// Pending or acknowledged alerts, keyed by priority
    pub open_alerts_by_priority: BTreeMap<String, usize>,
    pub generated_at: DateTime<Utc>,
}

impl OverviewSnapshot {
    pub fn total_ambulances(&self) -> usize {
        self.ambulances_by_status.values().sum()
    }

    pub fn open_alerts(&self) -> usize {
        self.open_alerts_by_priority.values().sum()
    }
}

/// Produces the current overview
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Result<OverviewSnapshot>;
}
