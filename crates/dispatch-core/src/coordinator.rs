//! Dispatch coordinator.
//!
//! Turns a pending request and an available ambulance into a planned route.
//! A dispatch is a single attempt:
//!
//! 1. validate the request, ambulance and hospitals and plan the route
//! 2. reserve the ambulance (`available → dispatched`, compare-and-set)
//! 3. claim the request (`pending → dispatched`, compare-and-set)
//! 4. persist the route
//!
//! If step 3 or 4 fails, the earlier writes are rolled back so the
//! ambulance returns to the pool and the request stays pending.

use chrono::{Duration, Utc};
use medinet_infra_common::{EventBus, LogContext};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument, Level};

use crate::error::{DispatchError, Result};
use crate::events::DispatchEvent;
use crate::planner::{RouteLeg, RoutePlanner};
use crate::store::DispatchStore;
use crate::types::{
    new_id, AmbulanceRoute, AmbulanceStatus, DispatchOrder, RequestStatus, RouteDestination,
    RouteOrigin, RoutePatient, RouteStatus,
};

#[derive(Clone)]
pub struct DispatchCoordinator {
    store: Arc<dyn DispatchStore>,
    planner: Arc<dyn RoutePlanner>,
    events: EventBus<DispatchEvent>,
}

impl DispatchCoordinator {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        planner: Arc<dyn RoutePlanner>,
        events: EventBus<DispatchEvent>,
    ) -> Self {
        Self {
            store,
            planner,
            events,
        }
    }

    /// Assign an ambulance to a pending request, producing a `planned` route
    pub async fn dispatch(&self, order: DispatchOrder) -> Result<AmbulanceRoute> {
        let span = LogContext::with_operation("dispatch", "dispatch")
            .with_field("request_id", order.request_id.as_str())
            .with_field("ambulance_id", order.ambulance_id.as_str())
            .span(Level::INFO);
        self.dispatch_inner(order).instrument(span).await
    }

    async fn dispatch_inner(&self, order: DispatchOrder) -> Result<AmbulanceRoute> {
        let request = self
            .store
            .get_request(&order.request_id)
            .await?
            .ok_or_else(|| DispatchError::RequestNotFound(order.request_id.clone()))?;
        if request.status != RequestStatus::Pending {
            return Err(DispatchError::invalid_state(format!(
                "request {} is {}, not pending",
                request.id, request.status
            )));
        }

        let ambulance = self
            .store
            .get_ambulance(&order.ambulance_id)
            .await?
            .ok_or_else(|| DispatchError::AmbulanceNotFound(order.ambulance_id.clone()))?;
        if ambulance.hospital_id != request.hospital_id {
            return Err(DispatchError::invalid_state(format!(
                "ambulance {} belongs to hospital {}, request was made at {}",
                ambulance.id, ambulance.hospital_id, request.hospital_id
            )));
        }
        if ambulance.status != AmbulanceStatus::Available {
            return Err(DispatchError::AmbulanceUnavailable {
                ambulance_id: ambulance.id,
                status: ambulance.status,
            });
        }

        let origin = self
            .store
            .get_hospital(&request.hospital_id)
            .await?
            .ok_or_else(|| DispatchError::HospitalNotFound(request.hospital_id.clone()))?;
        let destination = self
            .store
            .get_hospital(&order.destination_hospital_id)
            .await?
            .ok_or_else(|| DispatchError::HospitalNotFound(order.destination_hospital_id.clone()))?;

        let plan = self
            .planner
            .plan(&RouteLeg {
                origin: origin.coordinates,
                pickup: request.location.coordinates,
                destination: destination.coordinates,
            })
            .await?;

        if !self
            .store
            .transition_ambulance_status(
                &ambulance.id,
                AmbulanceStatus::Available,
                AmbulanceStatus::Dispatched,
            )
            .await?
        {
            let status = self
                .store
                .get_ambulance(&ambulance.id)
                .await?
                .ok_or_else(|| DispatchError::AmbulanceNotFound(ambulance.id.clone()))?
                .status;
            warn!("Ambulance {} was taken before it could be reserved", ambulance.id);
            return Err(DispatchError::AmbulanceUnavailable {
                ambulance_id: ambulance.id,
                status,
            });
        }

        match self
            .store
            .transition_request_status(&request.id, RequestStatus::Pending, RequestStatus::Dispatched)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                self.release_ambulance(&ambulance.id).await;
                return Err(DispatchError::invalid_state(format!(
                    "request {} is no longer pending",
                    request.id
                )));
            }
            Err(e) => {
                self.release_ambulance(&ambulance.id).await;
                return Err(e);
            }
        }

        let now = Utc::now();
        let route = AmbulanceRoute {
            id: new_id(),
            ambulance_id: ambulance.id.clone(),
            request_id: Some(request.id.clone()),
            origin: RouteOrigin {
                hospital_id: origin.id,
                name: origin.name,
            },
            destination: RouteDestination {
                hospital_id: destination.id,
                name: destination.name,
                address: destination.address,
            },
            dispatch_time: now,
            estimated_arrival_time: now + Duration::minutes(i64::from(plan.duration_minutes)),
            distance: plan.distance_km,
            duration: plan.duration_minutes,
            status: RouteStatus::Planned,
            patient: Some(RoutePatient::from(&request.patient_info)),
            notes: order.notes.filter(|n| !n.trim().is_empty()),
            updated_at: now,
        };

        if let Err(e) = self.store.insert_route(route.clone()).await {
            error!("Failed to store route for request {}: {}", request.id, e);
            self.release_ambulance(&ambulance.id).await;
            if let Err(revert) = self
                .store
                .transition_request_status(&request.id, RequestStatus::Dispatched, RequestStatus::Pending)
                .await
            {
                error!("Failed to return request {} to pending: {}", request.id, revert);
            }
            return Err(e);
        }

        info!(
            "Ambulance {} dispatched to request {} on route {} ({:.1} km, {} min)",
            ambulance.vehicle_id, request.id, route.id, route.distance, route.duration
        );
        self.events.publish(DispatchEvent::AmbulanceDispatched {
            route_id: route.id.clone(),
            ambulance_id: ambulance.id,
            request_id: request.id,
        });
        Ok(route)
    }

    async fn release_ambulance(&self, ambulance_id: &str) {
        match self
            .store
            .transition_ambulance_status(
                ambulance_id,
                AmbulanceStatus::Dispatched,
                AmbulanceStatus::Available,
            )
            .await
        {
            Ok(true) => info!("Reservation of ambulance {} released", ambulance_id),
            Ok(false) => warn!("Ambulance {} was not dispatched, nothing to release", ambulance_id),
            Err(e) => error!("Failed to release ambulance {}: {}", ambulance_id, e),
        }
    }
}
