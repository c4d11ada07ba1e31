//! Read side of ambulance routes

use std::sync::Arc;

use crate::error::{DispatchError, Result};
use crate::store::DispatchStore;
use crate::types::{AmbulanceRoute, RouteStatus};

#[derive(Clone)]
pub struct RouteTracker {
    store: Arc<dyn DispatchStore>,
}

impl RouteTracker {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<AmbulanceRoute> {
        self.store
            .get_route(id)
            .await?
            .ok_or_else(|| DispatchError::RouteNotFound(id.to_string()))
    }

    /// Routes originating at a hospital, newest dispatch first
    pub async fn list(
        &self,
        hospital_id: &str,
        status: Option<RouteStatus>,
    ) -> Result<Vec<AmbulanceRoute>> {
        if self.store.get_hospital(hospital_id).await?.is_none() {
            return Err(DispatchError::HospitalNotFound(hospital_id.to_string()));
        }
        let mut routes = self.store.list_routes(Some(hospital_id)).await?;
        if let Some(status) = status {
            routes.retain(|r| r.status == status);
        }
        routes.sort_by(|a, b| b.dispatch_time.cmp(&a.dispatch_time));
        Ok(routes)
    }

    /// The planned or in-progress route of an ambulance, if any
    pub async fn active_route_for(&self, ambulance_id: &str) -> Result<Option<AmbulanceRoute>> {
        Ok(self
            .store
            .list_routes_for_ambulance(ambulance_id)
            .await?
            .into_iter()
            .find(|r| r.status.is_active()))
    }

    pub async fn active_count(&self) -> Result<usize> {
        Ok(self
            .store
            .list_routes(None)
            .await?
            .iter()
            .filter(|r| r.status.is_active())
            .count())
    }
}
