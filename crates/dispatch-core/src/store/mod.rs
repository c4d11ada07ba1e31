//! Persistence seam for the dispatch domain.
//!
//! Two implementations ship with the crate: [`InMemoryDispatchStore`] backed
//! by `DashMap`, and [`SqliteDispatchStore`] backed by an sqlx pool.
//!
//! The `transition_*` methods are compare-and-set writes: they only apply
//! when the stored status equals `from`, and report whether they did. The
//! dispatch invariants rest on these being atomic per row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    Ambulance, AmbulanceRequest, AmbulanceRoute, AmbulanceStatus, Hospital, RequestStatus,
    RouteStatus,
};

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryDispatchStore;
pub use sqlite::SqliteDispatchStore;

#[async_trait]
pub trait DispatchStore: Send + Sync {
    // Hospitals
    async fn insert_hospital(&self, hospital: Hospital) -> Result<()>;
    async fn get_hospital(&self, id: &str) -> Result<Option<Hospital>>;
    async fn list_hospitals(&self) -> Result<Vec<Hospital>>;

    // Ambulances
    /// Fails with `Conflict` when the vehicle id is already registered
    async fn insert_ambulance(&self, ambulance: Ambulance) -> Result<()>;
    async fn get_ambulance(&self, id: &str) -> Result<Option<Ambulance>>;
    /// All ambulances, or only those of one hospital
    async fn list_ambulances(&self, hospital_id: Option<&str>) -> Result<Vec<Ambulance>>;
    async fn transition_ambulance_status(
        &self,
        id: &str,
        from: AmbulanceStatus,
        to: AmbulanceStatus,
    ) -> Result<bool>;
    /// Deletes only while the stored status equals `status`
    async fn delete_ambulance(&self, id: &str, status: AmbulanceStatus) -> Result<bool>;

    // Requests
    async fn insert_request(&self, request: AmbulanceRequest) -> Result<()>;
    async fn get_request(&self, id: &str) -> Result<Option<AmbulanceRequest>>;
    async fn list_requests(&self, hospital_id: Option<&str>) -> Result<Vec<AmbulanceRequest>>;
    async fn transition_request_status(
        &self,
        id: &str,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<bool>;

    // Routes
    async fn insert_route(&self, route: AmbulanceRoute) -> Result<()>;
    async fn get_route(&self, id: &str) -> Result<Option<AmbulanceRoute>>;
    /// All routes, or only those originating at one hospital
    async fn list_routes(&self, hospital_id: Option<&str>) -> Result<Vec<AmbulanceRoute>>;
    async fn list_routes_for_ambulance(&self, ambulance_id: &str) -> Result<Vec<AmbulanceRoute>>;
    async fn transition_route_status(
        &self,
        id: &str,
        from: RouteStatus,
        to: RouteStatus,
        at: DateTime<Utc>,
    ) -> Result<bool>;
}
