//! SQLite store behaviour against a real database file

use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

use medinet_dispatch_core::prelude::*;
use medinet_dispatch_core::{DispatchStore, SqliteDispatchStore};

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("dispatch.db").display())
}

fn new_request() -> NewAmbulanceRequest {
    NewAmbulanceRequest {
        caller_name: "Sam Reed".to_string(),
        caller_phone: "+44 20 7946 0958".to_string(),
        location: Location {
            address: "10 Downing St".to_string(),
            coordinates: Coordinates::new(51.5034, -0.1276),
        },
        patient_info: PatientInfo {
            name: "Lee Reed".to_string(),
            age: 8,
            gender: Gender::Female,
            symptoms: vec!["fever".to_string(), "rash".to_string()],
            condition: String::new(),
            emergency_level: EmergencyLevel::High,
        },
        notes: Some("gate code 4411".to_string()),
    }
}

#[tokio::test]
#[serial]
async fn lifecycle_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);

    let (hospital_id, ambulance_id, route_id, request_id) = {
        let engine = DispatchEngine::sqlite(&url, DispatchConfig::default())
            .await
            .unwrap();
        let hospital = engine
            .hospitals()
            .add(NewHospital {
                name: "St Thomas".to_string(),
                address: "Westminster Bridge Rd".to_string(),
                coordinates: Coordinates::new(51.4980, -0.1186),
            })
            .await
            .unwrap();
        let unit = engine
            .registry()
            .register(
                &hospital.id,
                NewAmbulance {
                    vehicle_id: "LDN-7".to_string(),
                    plate_number: "LX19 ABC".to_string(),
                    kind: AmbulanceType::Neonatal,
                },
            )
            .await
            .unwrap();
        let request = engine.queue().submit(&hospital.id, new_request()).await.unwrap();
        let route = engine
            .coordinator()
            .dispatch(DispatchOrder {
                request_id: request.id.clone(),
                ambulance_id: unit.id.clone(),
                destination_hospital_id: hospital.id.clone(),
                notes: None,
            })
            .await
            .unwrap();
        engine
            .status()
            .update_route_status(&route.id, RouteStatus::InProgress)
            .await
            .unwrap();
        (hospital.id, unit.id, route.id, request.id)
    };

    let engine = DispatchEngine::sqlite(&url, DispatchConfig::default())
        .await
        .unwrap();

    let route = engine.routes().get(&route_id).await.unwrap();
    assert_eq!(route.status, RouteStatus::InProgress);
    assert_eq!(route.patient.as_ref().map(|p| p.name.as_str()), Some("Lee Reed"));
    assert_eq!(route.request_id.as_deref(), Some(request_id.as_str()));

    let request = engine.queue().get(&request_id).await.unwrap();
    assert_eq!(request.patient_info.symptoms, vec!["fever", "rash"]);
    assert_eq!(request.notes.as_deref(), Some("gate code 4411"));
    assert_eq!(request.status, RequestStatus::Dispatched);

    engine
        .status()
        .update_route_status(&route_id, RouteStatus::Completed)
        .await
        .unwrap();
    let unit = engine.registry().get(&ambulance_id).await.unwrap();
    assert_eq!(unit.status, AmbulanceStatus::Available);
    assert_eq!(unit.kind, AmbulanceType::Neonatal);
    assert_eq!(engine.registry().list(&hospital_id, None).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn conditional_updates_only_apply_from_expected_status() {
    let dir = TempDir::new().unwrap();
    let store = SqliteDispatchStore::new(&database_url(&dir)).await.unwrap();

    store
        .insert_ambulance(Ambulance {
            id: "amb-1".to_string(),
            hospital_id: "h-1".to_string(),
            vehicle_id: "V-1".to_string(),
            plate_number: "P-1".to_string(),
            kind: AmbulanceType::Basic,
            status: AmbulanceStatus::Available,
            updated_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    assert!(store
        .transition_ambulance_status("amb-1", AmbulanceStatus::Available, AmbulanceStatus::Dispatched)
        .await
        .unwrap());
    assert!(!store
        .transition_ambulance_status("amb-1", AmbulanceStatus::Available, AmbulanceStatus::Dispatched)
        .await
        .unwrap());
    assert!(!store
        .transition_ambulance_status("missing", AmbulanceStatus::Available, AmbulanceStatus::Dispatched)
        .await
        .unwrap());

    // a dispatched ambulance is not deleted on a stale available read
    assert!(!store
        .delete_ambulance("amb-1", AmbulanceStatus::Available)
        .await
        .unwrap());
    assert!(store.get_ambulance("amb-1").await.unwrap().is_some());
    assert!(store
        .delete_ambulance("amb-1", AmbulanceStatus::Dispatched)
        .await
        .unwrap());
    assert!(store.get_ambulance("amb-1").await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn duplicate_vehicle_id_is_a_conflict() {
    let dir = TempDir::new().unwrap();
    let store = SqliteDispatchStore::new(&database_url(&dir)).await.unwrap();
    let ambulance = |id: &str| Ambulance {
        id: id.to_string(),
        hospital_id: "h-1".to_string(),
        vehicle_id: "V-1".to_string(),
        plate_number: "P-1".to_string(),
        kind: AmbulanceType::MobileIcu,
        status: AmbulanceStatus::Available,
        updated_at: chrono::Utc::now(),
    };

    store.insert_ambulance(ambulance("amb-1")).await.unwrap();
    let err = store.insert_ambulance(ambulance("amb-2")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Conflict(_)));
}
