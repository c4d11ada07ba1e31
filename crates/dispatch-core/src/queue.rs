//! Transport request queue

use chrono::Utc;
use medinet_infra_common::EventBus;
use std::sync::Arc;
use tracing::info;

use crate::error::{DispatchError, Result};
use crate::events::DispatchEvent;
use crate::intake::validate_new_request;
use crate::store::DispatchStore;
use crate::types::{new_id, AmbulanceRequest, NewAmbulanceRequest, RequestFilter, RequestStatus};

#[derive(Clone)]
pub struct RequestQueue {
    store: Arc<dyn DispatchStore>,
    events: EventBus<DispatchEvent>,
}

impl RequestQueue {
    pub fn new(store: Arc<dyn DispatchStore>, events: EventBus<DispatchEvent>) -> Self {
        Self { store, events }
    }

    /// Validate and enqueue a request as `pending`
    pub async fn submit(
        &self,
        hospital_id: &str,
        new: NewAmbulanceRequest,
    ) -> Result<AmbulanceRequest> {
        validate_new_request(&new)?;
        if self.store.get_hospital(hospital_id).await?.is_none() {
            return Err(DispatchError::HospitalNotFound(hospital_id.to_string()));
        }

        let request = AmbulanceRequest {
            id: new_id(),
            hospital_id: hospital_id.to_string(),
            timestamp: Utc::now(),
            status: RequestStatus::Pending,
            caller_name: new.caller_name.trim().to_string(),
            caller_phone: new.caller_phone.trim().to_string(),
            location: new.location,
            patient_info: new.patient_info,
            notes: new.notes.filter(|n| !n.trim().is_empty()),
        };
        self.store.insert_request(request.clone()).await?;

        info!(
            "Request {} queued at hospital {} ({})",
            request.id, hospital_id, request.patient_info.emergency_level
        );
        self.events.publish(DispatchEvent::RequestSubmitted {
            request_id: request.id.clone(),
            hospital_id: hospital_id.to_string(),
        });
        Ok(request)
    }

    pub async fn get(&self, id: &str) -> Result<AmbulanceRequest> {
        self.store
            .get_request(id)
            .await?
            .ok_or_else(|| DispatchError::RequestNotFound(id.to_string()))
    }

    /// Requests of a hospital, most urgent first, oldest first within a level
    pub async fn list(
        &self,
        hospital_id: &str,
        filter: &RequestFilter,
    ) -> Result<Vec<AmbulanceRequest>> {
        if self.store.get_hospital(hospital_id).await?.is_none() {
            return Err(DispatchError::HospitalNotFound(hospital_id.to_string()));
        }
        let mut requests = self.store.list_requests(Some(hospital_id)).await?;
        requests.retain(|r| {
            filter.status.map_or(true, |s| r.status == s)
                && filter.level.map_or(true, |l| r.patient_info.emergency_level == l)
        });
        requests.sort_by(|a, b| {
            b.patient_info
                .emergency_level
                .cmp(&a.patient_info.emergency_level)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        Ok(requests)
    }

    /// Cancel a request that has not been dispatched yet
    pub async fn cancel(&self, id: &str) -> Result<AmbulanceRequest> {
        let request = self.get(id).await?;
        if request.status != RequestStatus::Pending {
            return Err(DispatchError::invalid_state(format!(
                "request {} is {}, only pending requests can be cancelled",
                id, request.status
            )));
        }
        if !self
            .store
            .transition_request_status(id, RequestStatus::Pending, RequestStatus::Cancelled)
            .await?
        {
            return Err(DispatchError::invalid_state(format!(
                "request {} is no longer pending",
                id
            )));
        }

        info!("Request {} cancelled", id);
        self.events.publish(DispatchEvent::RequestStatusChanged {
            request_id: id.to_string(),
            status: RequestStatus::Cancelled,
        });
        self.get(id).await
    }

    /// Pending requests network-wide, or for one hospital
    pub async fn pending_count(&self, hospital_id: Option<&str>) -> Result<usize> {
        Ok(self
            .store
            .list_requests(hospital_id)
            .await?
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .count())
    }
}
