//! SQLite dispatch store using sqlx.
//!
//! Statuses are stored as their snake_case strings; patient details as JSON
//! text. Compare-and-set transitions are single `UPDATE ... WHERE status = ?`
//! statements, so SQLite's row locking provides the atomicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use super::DispatchStore;
use crate::error::{DispatchError, Result};
use crate::types::{
    Ambulance, AmbulanceRequest, AmbulanceRoute, AmbulanceStatus, AmbulanceType, Coordinates,
    Hospital, Location, PatientInfo, RequestStatus, RouteDestination, RouteOrigin, RoutePatient,
    RouteStatus,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS hospitals (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        address TEXT NOT NULL,
        lat REAL NOT NULL,
        lng REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ambulances (
        id TEXT PRIMARY KEY,
        hospital_id TEXT NOT NULL,
        vehicle_id TEXT NOT NULL UNIQUE,
        plate_number TEXT NOT NULL,
        kind TEXT NOT NULL,
        status TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_ambulances_hospital ON ambulances(hospital_id)",
    "CREATE TABLE IF NOT EXISTS ambulance_requests (
        id TEXT PRIMARY KEY,
        hospital_id TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        status TEXT NOT NULL,
        caller_name TEXT NOT NULL,
        caller_phone TEXT NOT NULL,
        address TEXT NOT NULL,
        lat REAL NOT NULL,
        lng REAL NOT NULL,
        patient TEXT NOT NULL,
        notes TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_requests_hospital ON ambulance_requests(hospital_id)",
    "CREATE TABLE IF NOT EXISTS ambulance_routes (
        id TEXT PRIMARY KEY,
        ambulance_id TEXT NOT NULL,
        request_id TEXT,
        origin_hospital_id TEXT NOT NULL,
        origin_name TEXT NOT NULL,
        destination_hospital_id TEXT NOT NULL,
        destination_name TEXT NOT NULL,
        destination_address TEXT NOT NULL,
        dispatch_time TEXT NOT NULL,
        estimated_arrival_time TEXT NOT NULL,
        distance REAL NOT NULL,
        duration INTEGER NOT NULL,
        status TEXT NOT NULL,
        patient TEXT,
        notes TEXT,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_routes_ambulance ON ambulance_routes(ambulance_id)",
    "CREATE INDEX IF NOT EXISTS idx_routes_origin ON ambulance_routes(origin_hospital_id)",
];

/// sqlx-backed store
#[derive(Clone)]
pub struct SqliteDispatchStore {
    pool: SqlitePool,
}

impl SqliteDispatchStore {
    /// Connect (creating the file if needed) and ensure the schema exists
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // every connection to :memory: is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Dispatch store ready at {}", database_url);
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Dispatch schema applied ({} statements)", SCHEMA.len());
        Ok(())
    }
}

fn hospital_from_row(row: &SqliteRow) -> Result<Hospital> {
    Ok(Hospital {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        coordinates: Coordinates::new(row.try_get("lat")?, row.try_get("lng")?),
    })
}

fn ambulance_from_row(row: &SqliteRow) -> Result<Ambulance> {
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;
    Ok(Ambulance {
        id: row.try_get("id")?,
        hospital_id: row.try_get("hospital_id")?,
        vehicle_id: row.try_get("vehicle_id")?,
        plate_number: row.try_get("plate_number")?,
        kind: AmbulanceType::from_str(&kind)?,
        status: AmbulanceStatus::from_str(&status)?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn request_from_row(row: &SqliteRow) -> Result<AmbulanceRequest> {
    let status: String = row.try_get("status")?;
    let patient: String = row.try_get("patient")?;
    Ok(AmbulanceRequest {
        id: row.try_get("id")?,
        hospital_id: row.try_get("hospital_id")?,
        timestamp: row.try_get("timestamp")?,
        status: RequestStatus::from_str(&status)?,
        caller_name: row.try_get("caller_name")?,
        caller_phone: row.try_get("caller_phone")?,
        location: Location {
            address: row.try_get("address")?,
            coordinates: Coordinates::new(row.try_get("lat")?, row.try_get("lng")?),
        },
        patient_info: serde_json::from_str::<PatientInfo>(&patient)?,
        notes: row.try_get("notes")?,
    })
}

fn route_from_row(row: &SqliteRow) -> Result<AmbulanceRoute> {
    let status: String = row.try_get("status")?;
    let patient: Option<String> = row.try_get("patient")?;
    let duration: i64 = row.try_get("duration")?;
    Ok(AmbulanceRoute {
        id: row.try_get("id")?,
        ambulance_id: row.try_get("ambulance_id")?,
        request_id: row.try_get("request_id")?,
        origin: RouteOrigin {
            hospital_id: row.try_get("origin_hospital_id")?,
            name: row.try_get("origin_name")?,
        },
        destination: RouteDestination {
            hospital_id: row.try_get("destination_hospital_id")?,
            name: row.try_get("destination_name")?,
            address: row.try_get("destination_address")?,
        },
        dispatch_time: row.try_get("dispatch_time")?,
        estimated_arrival_time: row.try_get("estimated_arrival_time")?,
        distance: row.try_get("distance")?,
        duration: u32::try_from(duration)
            .map_err(|_| DispatchError::storage(format!("route duration out of range: {}", duration)))?,
        status: RouteStatus::from_str(&status)?,
        patient: patient
            .map(|json| serde_json::from_str::<RoutePatient>(&json))
            .transpose()?,
        notes: row.try_get("notes")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl DispatchStore for SqliteDispatchStore {
    async fn insert_hospital(&self, hospital: Hospital) -> Result<()> {
        sqlx::query("INSERT INTO hospitals (id, name, address, lat, lng) VALUES (?, ?, ?, ?, ?)")
            .bind(&hospital.id)
            .bind(&hospital.name)
            .bind(&hospital.address)
            .bind(hospital.coordinates.lat)
            .bind(hospital.coordinates.lng)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_hospital(&self, id: &str) -> Result<Option<Hospital>> {
        sqlx::query("SELECT * FROM hospitals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| hospital_from_row(&row))
            .transpose()
    }

    async fn list_hospitals(&self) -> Result<Vec<Hospital>> {
        sqlx::query("SELECT * FROM hospitals ORDER BY name")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(hospital_from_row)
            .collect()
    }

    async fn insert_ambulance(&self, ambulance: Ambulance) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO ambulances (id, hospital_id, vehicle_id, plate_number, kind, status, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ambulance.id)
        .bind(&ambulance.hospital_id)
        .bind(&ambulance.vehicle_id)
        .bind(&ambulance.plate_number)
        .bind(ambulance.kind.as_str())
        .bind(ambulance.status.as_str())
        .bind(ambulance.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(DispatchError::Conflict(
                format!("vehicle {} is already registered", ambulance.vehicle_id),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_ambulance(&self, id: &str) -> Result<Option<Ambulance>> {
        sqlx::query("SELECT * FROM ambulances WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| ambulance_from_row(&row))
            .transpose()
    }

    async fn list_ambulances(&self, hospital_id: Option<&str>) -> Result<Vec<Ambulance>> {
        let rows = match hospital_id {
            Some(hospital_id) => {
                sqlx::query("SELECT * FROM ambulances WHERE hospital_id = ? ORDER BY vehicle_id")
                    .bind(hospital_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM ambulances ORDER BY vehicle_id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(ambulance_from_row).collect()
    }

    async fn transition_ambulance_status(
        &self,
        id: &str,
        from: AmbulanceStatus,
        to: AmbulanceStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE ambulances SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_ambulance(&self, id: &str, status: AmbulanceStatus) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ambulances WHERE id = ? AND status = ?")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_request(&self, request: AmbulanceRequest) -> Result<()> {
        let patient = serde_json::to_string(&request.patient_info)?;
        sqlx::query(
            "INSERT INTO ambulance_requests
                (id, hospital_id, timestamp, status, caller_name, caller_phone, address, lat, lng, patient, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id)
        .bind(&request.hospital_id)
        .bind(request.timestamp)
        .bind(request.status.as_str())
        .bind(&request.caller_name)
        .bind(&request.caller_phone)
        .bind(&request.location.address)
        .bind(request.location.coordinates.lat)
        .bind(request.location.coordinates.lng)
        .bind(patient)
        .bind(&request.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_request(&self, id: &str) -> Result<Option<AmbulanceRequest>> {
        sqlx::query("SELECT * FROM ambulance_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| request_from_row(&row))
            .transpose()
    }

    async fn list_requests(&self, hospital_id: Option<&str>) -> Result<Vec<AmbulanceRequest>> {
        let rows = match hospital_id {
            Some(hospital_id) => {
                sqlx::query("SELECT * FROM ambulance_requests WHERE hospital_id = ?")
                    .bind(hospital_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM ambulance_requests")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(request_from_row).collect()
    }

    async fn transition_request_status(
        &self,
        id: &str,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE ambulance_requests SET status = ? WHERE id = ? AND status = ?")
                .bind(to.as_str())
                .bind(id)
                .bind(from.as_str())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_route(&self, route: AmbulanceRoute) -> Result<()> {
        let patient = route
            .patient
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            "INSERT INTO ambulance_routes
                (id, ambulance_id, request_id, origin_hospital_id, origin_name,
                 destination_hospital_id, destination_name, destination_address,
                 dispatch_time, estimated_arrival_time, distance, duration, status,
                 patient, notes, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&route.id)
        .bind(&route.ambulance_id)
        .bind(&route.request_id)
        .bind(&route.origin.hospital_id)
        .bind(&route.origin.name)
        .bind(&route.destination.hospital_id)
        .bind(&route.destination.name)
        .bind(&route.destination.address)
        .bind(route.dispatch_time)
        .bind(route.estimated_arrival_time)
        .bind(route.distance)
        .bind(i64::from(route.duration))
        .bind(route.status.as_str())
        .bind(patient)
        .bind(&route.notes)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_route(&self, id: &str) -> Result<Option<AmbulanceRoute>> {
        sqlx::query("SELECT * FROM ambulance_routes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| route_from_row(&row))
            .transpose()
    }

    async fn list_routes(&self, hospital_id: Option<&str>) -> Result<Vec<AmbulanceRoute>> {
        let rows = match hospital_id {
            Some(hospital_id) => {
                sqlx::query("SELECT * FROM ambulance_routes WHERE origin_hospital_id = ?")
                    .bind(hospital_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM ambulance_routes")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(route_from_row).collect()
    }

    async fn list_routes_for_ambulance(&self, ambulance_id: &str) -> Result<Vec<AmbulanceRoute>> {
        sqlx::query("SELECT * FROM ambulance_routes WHERE ambulance_id = ?")
            .bind(ambulance_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(route_from_row)
            .collect()
    }

    async fn transition_route_status(
        &self,
        id: &str,
        from: RouteStatus,
        to: RouteStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE ambulance_routes SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(at)
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
