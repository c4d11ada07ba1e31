//! Ambulance registry.
//!
//! Owns registration and manual status changes. `dispatched` is owned by
//! the dispatch path: only the coordinator moves an ambulance into it and
//! only the status updater (or a dispatch rollback) moves it out. A
//! dispatched ambulance can neither change status by hand nor be removed,
//! even in the window before its route is stored.

use chrono::Utc;
use medinet_infra_common::EventBus;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DispatchError, Result};
use crate::events::DispatchEvent;
use crate::intake::FieldErrors;
use crate::routes::RouteTracker;
use crate::store::DispatchStore;
use crate::types::{new_id, Ambulance, AmbulanceStatus, NewAmbulance};

#[derive(Clone)]
pub struct AmbulanceRegistry {
    store: Arc<dyn DispatchStore>,
    routes: RouteTracker,
    events: EventBus<DispatchEvent>,
}

impl AmbulanceRegistry {
    pub fn new(store: Arc<dyn DispatchStore>, events: EventBus<DispatchEvent>) -> Self {
        Self {
            routes: RouteTracker::new(store.clone()),
            store,
            events,
        }
    }

    /// Register a new ambulance with the hospital; it starts `available`
    pub async fn register(&self, hospital_id: &str, new: NewAmbulance) -> Result<Ambulance> {
        let mut errors = FieldErrors::default();
        if new.vehicle_id.trim().is_empty() {
            errors.add("vehicleId", "Vehicle id is required");
        }
        if new.plate_number.trim().is_empty() {
            errors.add("plateNumber", "Plate number is required");
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        if self.store.get_hospital(hospital_id).await?.is_none() {
            return Err(DispatchError::HospitalNotFound(hospital_id.to_string()));
        }

        let ambulance = Ambulance {
            id: new_id(),
            hospital_id: hospital_id.to_string(),
            vehicle_id: new.vehicle_id.trim().to_string(),
            plate_number: new.plate_number.trim().to_string(),
            kind: new.kind,
            status: AmbulanceStatus::Available,
            updated_at: Utc::now(),
        };
        self.store.insert_ambulance(ambulance.clone()).await?;

        info!(
            "Ambulance {} ({}) registered at hospital {}",
            ambulance.vehicle_id, ambulance.id, hospital_id
        );
        self.events.publish(DispatchEvent::AmbulanceRegistered {
            ambulance_id: ambulance.id.clone(),
            hospital_id: hospital_id.to_string(),
        });
        Ok(ambulance)
    }

    pub async fn get(&self, id: &str) -> Result<Ambulance> {
        self.store
            .get_ambulance(id)
            .await?
            .ok_or_else(|| DispatchError::AmbulanceNotFound(id.to_string()))
    }

    /// Ambulances of one hospital, optionally narrowed to a status
    pub async fn list(
        &self,
        hospital_id: &str,
        status: Option<AmbulanceStatus>,
    ) -> Result<Vec<Ambulance>> {
        if self.store.get_hospital(hospital_id).await?.is_none() {
            return Err(DispatchError::HospitalNotFound(hospital_id.to_string()));
        }
        let mut ambulances = self.store.list_ambulances(Some(hospital_id)).await?;
        if let Some(status) = status {
            ambulances.retain(|a| a.status == status);
        }
        Ok(ambulances)
    }

    /// Every ambulance in the network
    pub async fn list_all(&self) -> Result<Vec<Ambulance>> {
        self.store.list_ambulances(None).await
    }

    /// Manual status change (maintenance, out of service, back to available)
    pub async fn set_status(&self, id: &str, status: AmbulanceStatus) -> Result<Ambulance> {
        if status == AmbulanceStatus::Dispatched {
            return Err(DispatchError::invalid_state(
                "ambulances are only dispatched by assigning them to a request",
            ));
        }

        let current = self.get(id).await?;
        if current.status == status {
            debug!("Ambulance {} already {}", id, status);
            return Ok(current);
        }

        if current.status == AmbulanceStatus::Dispatched {
            return Err(self.dispatched_error(id).await?);
        }

        if !self
            .store
            .transition_ambulance_status(id, current.status, status)
            .await?
        {
            return Err(DispatchError::Conflict(format!(
                "ambulance {} changed status concurrently",
                id
            )));
        }

        info!("Ambulance {} status {} -> {}", id, current.status, status);
        self.events.publish(DispatchEvent::AmbulanceStatusChanged {
            ambulance_id: id.to_string(),
            status,
        });
        self.get(id).await
    }

    /// Remove an ambulance that is not dispatched
    pub async fn remove(&self, id: &str) -> Result<()> {
        let ambulance = self.get(id).await?;
        if ambulance.status == AmbulanceStatus::Dispatched {
            return Err(self.dispatched_error(id).await?);
        }
        if !self.store.delete_ambulance(id, ambulance.status).await? {
            return match self.store.get_ambulance(id).await? {
                Some(_) => Err(DispatchError::Conflict(format!(
                    "ambulance {} changed status concurrently",
                    id
                ))),
                None => Err(DispatchError::AmbulanceNotFound(id.to_string())),
            };
        }

        info!("Ambulance {} ({}) removed", ambulance.vehicle_id, id);
        self.events.publish(DispatchEvent::AmbulanceRemoved {
            ambulance_id: id.to_string(),
        });
        Ok(())
    }

    async fn dispatched_error(&self, id: &str) -> Result<DispatchError> {
        Ok(match self.routes.active_route_for(id).await? {
            Some(route) => DispatchError::invalid_state(format!(
                "ambulance {} is on active route {}",
                id, route.id
            )),
            None => DispatchError::invalid_state(format!(
                "ambulance {} is being dispatched",
                id
            )),
        })
    }
}
