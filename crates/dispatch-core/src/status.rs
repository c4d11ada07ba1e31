//! Route status updates

use chrono::Utc;
use medinet_infra_common::EventBus;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{DispatchError, Result};
use crate::events::DispatchEvent;
use crate::store::DispatchStore;
use crate::types::{AmbulanceRoute, AmbulanceStatus, RequestStatus, RouteStatus};

/// Walks routes through their lifecycle and frees ambulances when a route ends
#[derive(Clone)]
pub struct StatusUpdater {
    store: Arc<dyn DispatchStore>,
    events: EventBus<DispatchEvent>,
}

impl StatusUpdater {
    pub fn new(store: Arc<dyn DispatchStore>, events: EventBus<DispatchEvent>) -> Self {
        Self { store, events }
    }

    /// Move a route to `status`.
    ///
    /// Setting the current status again is a no-op. On `completed` or
    /// `cancelled` the linked request follows and the ambulance becomes
    /// `available`. The route write and the ambulance write are separate: if
    /// the release fails the route keeps its new status and the error is
    /// returned.
    pub async fn update_route_status(
        &self,
        route_id: &str,
        status: RouteStatus,
    ) -> Result<AmbulanceRoute> {
        let route = self.get_route(route_id).await?;
        if route.status == status {
            debug!("Route {} already {}", route_id, status);
            return Ok(route);
        }
        if !route.status.can_transition_to(status) {
            return Err(DispatchError::InvalidTransition {
                entity: "route",
                from: route.status.to_string(),
                to: status.to_string(),
            });
        }

        if !self
            .store
            .transition_route_status(route_id, route.status, status, Utc::now())
            .await?
        {
            return Err(DispatchError::Conflict(format!(
                "route {} changed status concurrently",
                route_id
            )));
        }

        info!("Route {} {} -> {}", route_id, route.status, status);
        self.events.publish(DispatchEvent::RouteStatusChanged {
            route_id: route_id.to_string(),
            from: route.status,
            to: status,
        });

        if status.is_terminal() {
            if let Some(request_id) = &route.request_id {
                self.close_request(request_id, status).await;
            }
            self.release_ambulance(&route.ambulance_id).await?;
        }

        self.get_route(route_id).await
    }

    async fn get_route(&self, route_id: &str) -> Result<AmbulanceRoute> {
        self.store
            .get_route(route_id)
            .await?
            .ok_or_else(|| DispatchError::RouteNotFound(route_id.to_string()))
    }

    async fn close_request(&self, request_id: &str, route_status: RouteStatus) {
        let next = match route_status {
            RouteStatus::Completed => RequestStatus::Completed,
            _ => RequestStatus::Cancelled,
        };
        match self
            .store
            .transition_request_status(request_id, RequestStatus::Dispatched, next)
            .await
        {
            Ok(true) => {
                self.events.publish(DispatchEvent::RequestStatusChanged {
                    request_id: request_id.to_string(),
                    status: next,
                });
            }
            Ok(false) => warn!("Request {} was not dispatched, left unchanged", request_id),
            Err(e) => error!("Failed to close request {}: {}", request_id, e),
        }
    }

    async fn release_ambulance(&self, ambulance_id: &str) -> Result<()> {
        match self
            .store
            .transition_ambulance_status(
                ambulance_id,
                AmbulanceStatus::Dispatched,
                AmbulanceStatus::Available,
            )
            .await
        {
            Ok(true) => {
                info!("Ambulance {} is available again", ambulance_id);
                self.events.publish(DispatchEvent::AmbulanceStatusChanged {
                    ambulance_id: ambulance_id.to_string(),
                    status: AmbulanceStatus::Available,
                });
                Ok(())
            }
            Ok(false) => {
                warn!("Ambulance {} was not dispatched, status left unchanged", ambulance_id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to release ambulance {}: {}", ambulance_id, e);
                Err(e)
            }
        }
    }
}
