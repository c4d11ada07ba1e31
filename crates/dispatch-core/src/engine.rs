//! Dispatch engine: wires the components to one store and event bus

use medinet_infra_common::{EventBus, EventSubscription};
use std::sync::Arc;
use tracing::info;

use crate::config::DispatchConfig;
use crate::coordinator::DispatchCoordinator;
use crate::error::Result;
use crate::events::DispatchEvent;
use crate::hospitals::HospitalDirectory;
use crate::planner::{DirectRoutePlanner, RoutePlanner};
use crate::queue::RequestQueue;
use crate::registry::AmbulanceRegistry;
use crate::routes::RouteTracker;
use crate::status::StatusUpdater;
use crate::store::{DispatchStore, InMemoryDispatchStore, SqliteDispatchStore};

#[derive(Clone)]
pub struct DispatchEngine {
    config: DispatchConfig,
    events: EventBus<DispatchEvent>,
    hospitals: HospitalDirectory,
    registry: AmbulanceRegistry,
    queue: RequestQueue,
    routes: RouteTracker,
    coordinator: DispatchCoordinator,
    status: StatusUpdater,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        planner: Arc<dyn RoutePlanner>,
        config: DispatchConfig,
    ) -> Self {
        let events = EventBus::with_capacity("dispatch", config.event_capacity);
        Self {
            hospitals: HospitalDirectory::new(store.clone()),
            registry: AmbulanceRegistry::new(store.clone(), events.clone()),
            queue: RequestQueue::new(store.clone(), events.clone()),
            routes: RouteTracker::new(store.clone()),
            coordinator: DispatchCoordinator::new(store.clone(), planner, events.clone()),
            status: StatusUpdater::new(store, events.clone()),
            events,
            config,
        }
    }

    /// Engine over an in-memory store with the direct planner
    pub fn in_memory(config: DispatchConfig) -> Self {
        let planner = Arc::new(DirectRoutePlanner::from_config(&config));
        Self::new(Arc::new(InMemoryDispatchStore::new()), planner, config)
    }

    /// Engine over a SQLite database with the direct planner
    pub async fn sqlite(database_url: &str, config: DispatchConfig) -> Result<Self> {
        config.validate()?;
        let store = SqliteDispatchStore::new(database_url).await?;
        let planner = Arc::new(DirectRoutePlanner::from_config(&config));
        info!("Dispatch engine using SQLite at {}", database_url);
        Ok(Self::new(Arc::new(store), planner, config))
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn hospitals(&self) -> &HospitalDirectory {
        &self.hospitals
    }

    pub fn registry(&self) -> &AmbulanceRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn routes(&self) -> &RouteTracker {
        &self.routes
    }

    pub fn coordinator(&self) -> &DispatchCoordinator {
        &self.coordinator
    }

    pub fn status(&self) -> &StatusUpdater {
        &self.status
    }

    pub fn events(&self) -> &EventBus<DispatchEvent> {
        &self.events
    }

    pub fn subscribe(&self) -> EventSubscription<DispatchEvent> {
        self.events.subscribe()
    }
}
