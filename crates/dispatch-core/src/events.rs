//! Change notifications published by the dispatch engine

use serde::Serialize;

use crate::types::{AmbulanceStatus, RequestStatus, RouteStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    AmbulanceRegistered {
        ambulance_id: String,
        hospital_id: String,
    },
    AmbulanceStatusChanged {
        ambulance_id: String,
        status: AmbulanceStatus,
    },
    AmbulanceRemoved {
        ambulance_id: String,
    },
    RequestSubmitted {
        request_id: String,
        hospital_id: String,
    },
    RequestStatusChanged {
        request_id: String,
        status: RequestStatus,
    },
    AmbulanceDispatched {
        route_id: String,
        ambulance_id: String,
        request_id: String,
    },
    RouteStatusChanged {
        route_id: String,
        from: RouteStatus,
        to: RouteStatus,
    },
}

impl DispatchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AmbulanceRegistered { .. } => "ambulance_registered",
            Self::AmbulanceStatusChanged { .. } => "ambulance_status_changed",
            Self::AmbulanceRemoved { .. } => "ambulance_removed",
            Self::RequestSubmitted { .. } => "request_submitted",
            Self::RequestStatusChanged { .. } => "request_status_changed",
            Self::AmbulanceDispatched { .. } => "ambulance_dispatched",
            Self::RouteStatusChanged { .. } => "route_status_changed",
        }
    }
}
