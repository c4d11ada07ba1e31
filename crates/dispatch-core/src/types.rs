//! Core types for dispatch-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DispatchError;

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Generate a new entity id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Haversine distance in kilometres
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// A hospital in the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
}

/// Request to add a hospital
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHospital {
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbulanceStatus {
    Available,
    Dispatched,
    Maintenance,
    OutOfService,
}

impl AmbulanceStatus {
    pub const ALL: [AmbulanceStatus; 4] = [
        AmbulanceStatus::Available,
        AmbulanceStatus::Dispatched,
        AmbulanceStatus::Maintenance,
        AmbulanceStatus::OutOfService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Dispatched => "dispatched",
            Self::Maintenance => "maintenance",
            Self::OutOfService => "out_of_service",
        }
    }
}

impl FromStr for AmbulanceStatus {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "dispatched" => Ok(Self::Dispatched),
            "maintenance" => Ok(Self::Maintenance),
            "out_of_service" => Ok(Self::OutOfService),
            other => Err(DispatchError::InvalidValue(format!("ambulance status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbulanceType {
    Basic,
    Advanced,
    Neonatal,
    MobileIcu,
}

impl AmbulanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Neonatal => "neonatal",
            Self::MobileIcu => "mobile_icu",
        }
    }
}

impl FromStr for AmbulanceType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            "neonatal" => Ok(Self::Neonatal),
            "mobile_icu" => Ok(Self::MobileIcu),
            other => Err(DispatchError::InvalidValue(format!("ambulance type '{}'", other))),
        }
    }
}

/// An ambulance owned by a hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambulance {
    pub id: String,
    pub hospital_id: String,
    pub vehicle_id: String,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub kind: AmbulanceType,
    pub status: AmbulanceStatus,
    pub updated_at: DateTime<Utc>,
}

/// Request to register an ambulance
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAmbulance {
    pub vehicle_id: String,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub kind: AmbulanceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Dispatched,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "dispatched" => Ok(Self::Dispatched),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DispatchError::InvalidValue(format!("request status '{}'", other))),
        }
    }
}

/// Triage level of a transport request, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl EmergencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for EmergencyLevel {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(DispatchError::InvalidValue(format!("emergency level '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

/// Pickup location of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: String,
    pub age: u16,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub condition: String,
    pub emergency_level: EmergencyLevel,
}

/// A transport request waiting for (or served by) an ambulance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbulanceRequest {
    pub id: String,
    pub hospital_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: RequestStatus,
    pub caller_name: String,
    pub caller_phone: String,
    pub location: Location,
    pub patient_info: PatientInfo,
    pub notes: Option<String>,
}

/// Payload produced by the intake form or posted to the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAmbulanceRequest {
    pub caller_name: String,
    pub caller_phone: String,
    pub location: Location,
    pub patient_info: PatientInfo,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Planned or in progress
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Planned | Self::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Allowed lifecycle moves; same-status updates are handled by callers
    pub fn can_transition_to(&self, next: RouteStatus) -> bool {
        matches!(
            (self, next),
            (Self::Planned, Self::InProgress)
                | (Self::Planned, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}

impl FromStr for RouteStatus {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DispatchError::InvalidValue(format!("route status '{}'", other))),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(AmbulanceStatus, AmbulanceType, RequestStatus, EmergencyLevel, RouteStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOrigin {
    pub hospital_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDestination {
    pub hospital_id: String,
    pub name: String,
    pub address: String,
}

/// Patient summary carried on a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePatient {
    pub name: String,
    pub condition: String,
    pub emergency_level: EmergencyLevel,
}

impl From<&PatientInfo> for RoutePatient {
    fn from(info: &PatientInfo) -> Self {
        Self {
            name: info.name.clone(),
            condition: info.condition.clone(),
            emergency_level: info.emergency_level,
        }
    }
}

/// An ambulance transport from the origin hospital via the pickup to a destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbulanceRoute {
    pub id: String,
    pub ambulance_id: String,
    pub request_id: Option<String>,
    pub origin: RouteOrigin,
    pub destination: RouteDestination,
    pub dispatch_time: DateTime<Utc>,
    pub estimated_arrival_time: DateTime<Utc>,
    /// Kilometres
    pub distance: f64,
    /// Minutes
    pub duration: u32,
    pub status: RouteStatus,
    pub patient: Option<RoutePatient>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Instruction to send an ambulance to a pending request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOrder {
    pub request_id: String,
    pub ambulance_id: String,
    pub destination_hospital_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filter for request listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub level: Option<EmergencyLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_transitions() {
        use RouteStatus::*;
        assert!(Planned.can_transition_to(InProgress));
        assert!(Planned.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!Planned.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Planned));
        assert!(InProgress.is_active() && !Completed.is_active());
    }

    #[test]
    fn status_strings_round_trip_through_from_str() {
        for status in AmbulanceStatus::ALL {
            assert_eq!(status.as_str().parse::<AmbulanceStatus>().unwrap(), status);
        }
        assert!("parked".parse::<AmbulanceStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_values_and_camel_case_fields() {
        let json = serde_json::to_value(NewAmbulanceRequest {
            caller_name: "Ann".to_string(),
            caller_phone: "+1 555 0100".to_string(),
            location: Location {
                address: "5 Elm".to_string(),
                coordinates: Coordinates::new(1.0, 2.0),
            },
            patient_info: PatientInfo {
                name: "Bo".to_string(),
                age: 40,
                gender: Gender::Male,
                symptoms: vec!["chest pain".to_string()],
                condition: String::new(),
                emergency_level: EmergencyLevel::Critical,
            },
            notes: None,
        })
        .unwrap();
        assert_eq!(json["callerPhone"], "+1 555 0100");
        assert_eq!(json["patientInfo"]["emergencyLevel"], "critical");
    }

    #[test]
    fn haversine_distance() {
        let a = Coordinates::new(51.5007, -0.1246);
        let b = Coordinates::new(40.6892, -74.0445);
        let d = a.distance_km(&b);
        assert!((d - 5574.8).abs() < 5.0, "got {d}");
        assert_eq!(a.distance_km(&a), 0.0);
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
    }

    #[test]
    fn emergency_levels_order_by_urgency() {
        assert!(EmergencyLevel::Critical > EmergencyLevel::High);
        assert!(EmergencyLevel::Low < EmergencyLevel::Medium);
    }
}
