//! HTTP API
//!
//! All bodies are JSON. Failures come back as `{"error": "<message>"}` with
//! 400 for validation and invalid transitions, 404 for unknown ids, 409 for
//! busy ambulances and write conflicts, and 500 for storage failures.

pub mod alerts;
pub mod dashboard;
pub mod dispatch;
pub mod extract;
pub mod security_headers;

use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::state::ConsoleState;
use security_headers::security_headers_middleware;

/// The complete console router over `state`
pub fn router(state: ConsoleState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(dispatch::routes())
        .merge(alerts::routes())
        .merge(dashboard::routes())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "medinet-console",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
