//! Hospital directory

use std::sync::Arc;
use tracing::info;

use crate::error::{DispatchError, Result};
use crate::intake::FieldErrors;
use crate::store::DispatchStore;
use crate::types::{new_id, Hospital, NewHospital};

#[derive(Clone)]
pub struct HospitalDirectory {
    store: Arc<dyn DispatchStore>,
}

impl HospitalDirectory {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    pub async fn add(&self, new: NewHospital) -> Result<Hospital> {
        let mut errors = FieldErrors::default();
        if new.name.trim().is_empty() {
            errors.add("name", "Hospital name is required");
        }
        if new.address.trim().is_empty() {
            errors.add("address", "Hospital address is required");
        }
        if !new.coordinates.is_valid() {
            errors.add("coordinates", "Coordinates are out of range");
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let hospital = Hospital {
            id: new_id(),
            name: new.name.trim().to_string(),
            address: new.address.trim().to_string(),
            coordinates: new.coordinates,
        };
        self.store.insert_hospital(hospital.clone()).await?;
        info!("Hospital {} added ({})", hospital.name, hospital.id);
        Ok(hospital)
    }

    pub async fn get(&self, id: &str) -> Result<Hospital> {
        self.store
            .get_hospital(id)
            .await?
            .ok_or_else(|| DispatchError::HospitalNotFound(id.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Hospital>> {
        self.store.list_hospitals().await
    }
}
