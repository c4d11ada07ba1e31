//! Alert change notifications

use serde::Serialize;

use crate::types::{AlertPriority, AlertStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AlertEvent {
    Raised {
        alert_id: String,
        priority: AlertPriority,
        template_id: Option<String>,
    },
    StatusChanged {
        alert_id: String,
        status: AlertStatus,
    },
}
