//! End-to-end API tests against the in-memory console

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use medinet_console_api::{router, ConsoleState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    app: Router,
}

impl TestApp {
    fn new() -> Self {
        Self {
            app: router(ConsoleState::in_memory()),
        }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(body)).await
    }

    async fn hospital(&self, name: &str, lat: f64, lng: f64) -> String {
        let (status, body) = self
            .post(
                "/api/hospitals",
                json!({
                    "name": name,
                    "address": format!("{} Campus", name),
                    "coordinates": {"lat": lat, "lng": lng}
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn ambulance(&self, hospital_id: &str, vehicle: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/hospitals/{}/ambulances", hospital_id),
                json!({"vehicleId": vehicle, "plateNumber": "MN-4411", "type": "advanced"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn request(&self, hospital_id: &str, level: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/hospitals/{}/requests", hospital_id),
                json!({
                    "callerName": "Ana Ruiz",
                    "callerPhone": "(212) 555-0147",
                    "location": {
                        "address": "88 River Rd",
                        "coordinates": {"lat": 40.73, "lng": -73.99}
                    },
                    "patientInfo": {
                        "name": "Luis Ruiz",
                        "age": 67,
                        "gender": "male",
                        "symptoms": ["chest pain"],
                        "condition": "suspected MI",
                        "emergencyLevel": level
                    }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_carries_security_headers() {
    let app = router(ConsoleState::in_memory());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn dispatch_lifecycle_over_http() {
    let app = TestApp::new();
    let general = app.hospital("General", 40.71, -74.00).await;
    let mercy = app.hospital("Mercy", 40.76, -73.97).await;
    let ambulance = app.ambulance(&general, "AMB-07").await;
    let request = app.request(&general, "critical").await;

    let order = json!({
        "requestId": request,
        "ambulanceId": ambulance,
        "destinationHospitalId": mercy
    });
    let (status, route) = app.post("/api/dispatch", order.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", route);
    assert_eq!(route["status"], "planned");
    assert_eq!(route["destination"]["name"], "Mercy");
    let route_id = route["id"].as_str().unwrap().to_string();

    let (_, fleet) = app
        .get(&format!("/api/hospitals/{}/ambulances?status=dispatched", general))
        .await;
    assert_eq!(fleet.as_array().unwrap().len(), 1);

    let second_request = app.request(&general, "low").await;
    let (status, body) = app
        .post(
            "/api/dispatch",
            json!({
                "requestId": second_request,
                "ambulanceId": ambulance,
                "destinationHospitalId": mercy
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("not available"));

    let status_uri = format!("/api/routes/{}/status", route_id);
    let (status, _) = app.put(&status_uri, json!({"status": "in_progress"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, done) = app.put(&status_uri, json!({"status": "completed"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (_, fetched) = app.get(&format!("/api/ambulances/{}", ambulance)).await;
    assert_eq!(fetched["status"], "available");
    let (_, served) = app.get(&format!("/api/requests/{}", request)).await;
    assert_eq!(served["status"], "completed");

    let (status, body) = app.put(&status_uri, json!({"status": "cancelled"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, pending) = app
        .get(&format!("/api/hospitals/{}/requests?status=pending", general))
        .await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"], second_request.as_str());
}

#[tokio::test]
async fn errors_are_json_with_matching_status() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/routes/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Route not found: nope"}));

    let (status, body) = app.get("/api/hospitals/nope/ambulances?status=flying").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .post("/api/hospitals", json!({"name": "", "address": ""}))
        .await;
    assert!(status.is_client_error());
    assert!(body["error"].is_string());

    let general = app.hospital("General", 40.71, -74.00).await;
    let (status, body) = app
        .post(
            &format!("/api/hospitals/{}/requests", general),
            json!({
                "callerName": "",
                "callerPhone": "call me",
                "location": {"address": "x", "coordinates": {"lat": 0.0, "lng": 0.0}},
                "patientInfo": {"name": "P", "age": 30, "emergencyLevel": "low", "condition": "fall"}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("caller"));
}

#[tokio::test]
async fn ambulance_with_active_route_cannot_be_removed() {
    let app = TestApp::new();
    let general = app.hospital("General", 40.71, -74.00).await;
    let ambulance = app.ambulance(&general, "AMB-01").await;
    let request = app.request(&general, "high").await;
    let (status, _) = app
        .post(
            "/api/dispatch",
            json!({"requestId": request, "ambulanceId": ambulance, "destinationHospitalId": general}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/ambulances/{}", ambulance), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            &format!("/api/ambulances/{}/status", ambulance),
            json!({"status": "maintenance"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metric_reading_fires_template_and_alert_is_resolved() {
    let app = TestApp::new();
    let (status, template) = app
        .post(
            "/api/alert-templates",
            json!({
                "name": "Low oxygen",
                "title": "SpO2 low",
                "message": "{metric} at {value}",
                "type": "patient_vitals",
                "priority": "high",
                "condition": {"metric": "spo2", "type": "between", "threshold": 70.0, "secondaryThreshold": 90.0},
                "channels": ["dashboard"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", template);

    let (_, fired) = app
        .post("/api/metrics", json!({"metric": "spo2", "value": 95.0}))
        .await;
    assert_eq!(fired, json!([]));

    let (_, fired) = app
        .post("/api/metrics", json!({"metric": "spo2", "value": 85.0}))
        .await;
    assert_eq!(fired.as_array().unwrap().len(), 1);
    let alert_id = fired[0]["id"].as_str().unwrap().to_string();
    assert_eq!(fired[0]["message"], "spo2 at 85");

    let (_, open) = app.get("/api/alerts?status=pending&priority=high").await;
    assert_eq!(open.as_array().unwrap().len(), 1);

    let (status, acked) = app
        .post(
            &format!("/api/alerts/{}/acknowledge", alert_id),
            json!({"by": "nurse.kim"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked["acknowledgedBy"], "nurse.kim");

    let (status, _) = app
        .call(Method::POST, &format!("/api/alerts/{}/resolve", alert_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::POST, &format!("/api/alerts/{}/acknowledge", alert_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggling_a_channel_twice_restores_settings() {
    let app = TestApp::new();
    let (_, original) = app.get("/api/notification-settings").await;

    let uri = "/api/notification-settings/channels/sms/toggle";
    let (_, toggled) = app.call(Method::POST, uri, None).await;
    assert!(toggled["channels"]
        .as_array()
        .unwrap()
        .contains(&json!("sms")));
    let (_, restored) = app.call(Method::POST, uri, None).await;
    assert_eq!(restored, original);

    let (status, _) = app
        .call(Method::POST, "/api/notification-settings/channels/pager/toggle", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sections_reorder_and_overview_counts() {
    let app = TestApp::new();
    let (_, config) = app.get("/api/dashboard/config").await;
    assert_eq!(config["layout"][0]["id"], "network-status");

    let (status, layout) = app
        .post(
            "/api/dashboard/sections/network-status/move",
            json!({"direction": "down"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(layout[0]["id"], "ambulance-fleet");
    assert_eq!(layout[1]["id"], "network-status");

    let (status, _) = app
        .post("/api/dashboard/sections/billing/move", json!({"direction": "up"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .put(
            "/api/dashboard/config",
            json!({"refreshIntervalSecs": 1, "autoRefresh": true}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let general = app.hospital("General", 40.71, -74.00).await;
    app.ambulance(&general, "AMB-01").await;
    app.ambulance(&general, "AMB-02").await;
    app.request(&general, "medium").await;

    let (status, overview) = app.get("/api/dashboard/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["hospitals"], 1);
    assert_eq!(overview["ambulancesByStatus"]["available"], 2);
    assert_eq!(overview["ambulancesByStatus"]["dispatched"], 0);
    assert_eq!(overview["pendingRequests"], 1);
    assert_eq!(overview["activeRoutes"], 0);
}
