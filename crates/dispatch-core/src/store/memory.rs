//! In-memory dispatch store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use super::DispatchStore;
use crate::error::{DispatchError, Result};
use crate::types::{
    Ambulance, AmbulanceRequest, AmbulanceRoute, AmbulanceStatus, Hospital, RequestStatus,
    RouteStatus,
};

/// DashMap-backed store; status transitions hold the entry's shard lock
#[derive(Clone, Default)]
pub struct InMemoryDispatchStore {
    hospitals: Arc<DashMap<String, Hospital>>,
    ambulances: Arc<DashMap<String, Ambulance>>,
    /// vehicle id → ambulance id
    vehicle_index: Arc<DashMap<String, String>>,
    requests: Arc<DashMap<String, AmbulanceRequest>>,
    routes: Arc<DashMap<String, AmbulanceRoute>>,
}

impl InMemoryDispatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DispatchStore for InMemoryDispatchStore {
    async fn insert_hospital(&self, hospital: Hospital) -> Result<()> {
        self.hospitals.insert(hospital.id.clone(), hospital);
        Ok(())
    }

    async fn get_hospital(&self, id: &str) -> Result<Option<Hospital>> {
        Ok(self.hospitals.get(id).map(|entry| entry.clone()))
    }

    async fn list_hospitals(&self) -> Result<Vec<Hospital>> {
        let mut hospitals: Vec<Hospital> = self.hospitals.iter().map(|e| e.clone()).collect();
        hospitals.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hospitals)
    }

    async fn insert_ambulance(&self, ambulance: Ambulance) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.vehicle_index.entry(ambulance.vehicle_id.clone()) {
            Entry::Occupied(_) => Err(DispatchError::Conflict(format!(
                "vehicle {} is already registered",
                ambulance.vehicle_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(ambulance.id.clone());
                self.ambulances.insert(ambulance.id.clone(), ambulance);
                Ok(())
            }
        }
    }

    async fn get_ambulance(&self, id: &str) -> Result<Option<Ambulance>> {
        Ok(self.ambulances.get(id).map(|entry| entry.clone()))
    }

    async fn list_ambulances(&self, hospital_id: Option<&str>) -> Result<Vec<Ambulance>> {
        let mut ambulances: Vec<Ambulance> = self
            .ambulances
            .iter()
            .filter(|e| hospital_id.map_or(true, |h| e.hospital_id == h))
            .map(|e| e.clone())
            .collect();
        ambulances.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        Ok(ambulances)
    }

    async fn transition_ambulance_status(
        &self,
        id: &str,
        from: AmbulanceStatus,
        to: AmbulanceStatus,
    ) -> Result<bool> {
        match self.ambulances.get_mut(id) {
            Some(mut entry) if entry.status == from => {
                entry.status = to;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_ambulance(&self, id: &str, status: AmbulanceStatus) -> Result<bool> {
        match self.ambulances.remove_if(id, |_, a| a.status == status) {
            Some((_, ambulance)) => {
                self.vehicle_index.remove(&ambulance.vehicle_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_request(&self, request: AmbulanceRequest) -> Result<()> {
        self.requests.insert(request.id.clone(), request);
        Ok(())
    }

    async fn get_request(&self, id: &str) -> Result<Option<AmbulanceRequest>> {
        Ok(self.requests.get(id).map(|entry| entry.clone()))
    }

    async fn list_requests(&self, hospital_id: Option<&str>) -> Result<Vec<AmbulanceRequest>> {
        Ok(self
            .requests
            .iter()
            .filter(|e| hospital_id.map_or(true, |h| e.hospital_id == h))
            .map(|e| e.clone())
            .collect())
    }

    async fn transition_request_status(
        &self,
        id: &str,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<bool> {
        match self.requests.get_mut(id) {
            Some(mut entry) if entry.status == from => {
                entry.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_route(&self, route: AmbulanceRoute) -> Result<()> {
        self.routes.insert(route.id.clone(), route);
        Ok(())
    }

    async fn get_route(&self, id: &str) -> Result<Option<AmbulanceRoute>> {
        Ok(self.routes.get(id).map(|entry| entry.clone()))
    }

    async fn list_routes(&self, hospital_id: Option<&str>) -> Result<Vec<AmbulanceRoute>> {
        Ok(self
            .routes
            .iter()
            .filter(|e| hospital_id.map_or(true, |h| e.origin.hospital_id == h))
            .map(|e| e.clone())
            .collect())
    }

    async fn list_routes_for_ambulance(&self, ambulance_id: &str) -> Result<Vec<AmbulanceRoute>> {
        Ok(self
            .routes
            .iter()
            .filter(|e| e.ambulance_id == ambulance_id)
            .map(|e| e.clone())
            .collect())
    }

    async fn transition_route_status(
        &self,
        id: &str,
        from: RouteStatus,
        to: RouteStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        match self.routes.get_mut(id) {
            Some(mut entry) if entry.status == from => {
                entry.status = to;
                entry.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
