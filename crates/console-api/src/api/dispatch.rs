//! Hospitals, ambulances, requests, routes and dispatch

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use medinet_dispatch_core::types::{
    Ambulance, AmbulanceRequest, AmbulanceRoute, AmbulanceStatus, DispatchOrder, Hospital,
    NewAmbulance, NewAmbulanceRequest, NewHospital, RequestFilter, RouteStatus,
};
use serde::Deserialize;
use tracing::info;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::ApiResult;
use crate::state::ConsoleState;

pub fn routes() -> Router<ConsoleState> {
    Router::new()
        .route("/api/hospitals", get(list_hospitals).post(add_hospital))
        .route(
            "/api/hospitals/:id/ambulances",
            get(list_ambulances).post(register_ambulance),
        )
        .route("/api/ambulances/:id", get(get_ambulance).delete(remove_ambulance))
        .route("/api/ambulances/:id/status", put(set_ambulance_status))
        .route(
            "/api/hospitals/:id/requests",
            get(list_requests).post(submit_request),
        )
        .route("/api/requests/:id", get(get_request))
        .route("/api/requests/:id/cancel", post(cancel_request))
        .route("/api/hospitals/:id/routes", get(list_routes))
        .route("/api/dispatch", post(dispatch))
        .route("/api/routes/:id", get(get_route))
        .route("/api/routes/:id/status", put(update_route_status))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery<S> {
    pub status: Option<S>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody<S> {
    pub status: S,
}

async fn list_hospitals(State(state): State<ConsoleState>) -> ApiResult<Json<Vec<Hospital>>> {
    Ok(Json(state.dispatch.hospitals().list().await?))
}

async fn add_hospital(
    State(state): State<ConsoleState>,
    ApiJson(new): ApiJson<NewHospital>,
) -> ApiResult<(StatusCode, Json<Hospital>)> {
    let hospital = state.dispatch.hospitals().add(new).await?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

async fn list_ambulances(
    State(state): State<ConsoleState>,
    ApiPath(hospital_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<StatusQuery<AmbulanceStatus>>,
) -> ApiResult<Json<Vec<Ambulance>>> {
    let ambulances = state
        .dispatch
        .registry()
        .list(&hospital_id, query.status)
        .await?;
    Ok(Json(ambulances))
}

async fn register_ambulance(
    State(state): State<ConsoleState>,
    ApiPath(hospital_id): ApiPath<String>,
    ApiJson(new): ApiJson<NewAmbulance>,
) -> ApiResult<(StatusCode, Json<Ambulance>)> {
    let ambulance = state.dispatch.registry().register(&hospital_id, new).await?;
    Ok((StatusCode::CREATED, Json(ambulance)))
}

async fn get_ambulance(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Ambulance>> {
    Ok(Json(state.dispatch.registry().get(&id).await?))
}

async fn set_ambulance_status(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<StatusBody<AmbulanceStatus>>,
) -> ApiResult<Json<Ambulance>> {
    Ok(Json(state.dispatch.registry().set_status(&id, body.status).await?))
}

async fn remove_ambulance(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.dispatch.registry().remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_requests(
    State(state): State<ConsoleState>,
    ApiPath(hospital_id): ApiPath<String>,
    ApiQuery(filter): ApiQuery<RequestFilter>,
) -> ApiResult<Json<Vec<AmbulanceRequest>>> {
    Ok(Json(state.dispatch.queue().list(&hospital_id, &filter).await?))
}

async fn submit_request(
    State(state): State<ConsoleState>,
    ApiPath(hospital_id): ApiPath<String>,
    ApiJson(new): ApiJson<NewAmbulanceRequest>,
) -> ApiResult<(StatusCode, Json<AmbulanceRequest>)> {
    let request = state.dispatch.queue().submit(&hospital_id, new).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn get_request(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<AmbulanceRequest>> {
    Ok(Json(state.dispatch.queue().get(&id).await?))
}

async fn cancel_request(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<AmbulanceRequest>> {
    Ok(Json(state.dispatch.queue().cancel(&id).await?))
}

async fn list_routes(
    State(state): State<ConsoleState>,
    ApiPath(hospital_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<StatusQuery<RouteStatus>>,
) -> ApiResult<Json<Vec<AmbulanceRoute>>> {
    let routes = state
        .dispatch
        .routes()
        .list(&hospital_id, query.status)
        .await?;
    Ok(Json(routes))
}

async fn dispatch(
    State(state): State<ConsoleState>,
    ApiJson(order): ApiJson<DispatchOrder>,
) -> ApiResult<(StatusCode, Json<AmbulanceRoute>)> {
    let route = state.dispatch.coordinator().dispatch(order).await?;
    info!("Route {} created via API", route.id);
    Ok((StatusCode::CREATED, Json(route)))
}

async fn get_route(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<AmbulanceRoute>> {
    Ok(Json(state.dispatch.routes().get(&id).await?))
}

async fn update_route_status(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<StatusBody<RouteStatus>>,
) -> ApiResult<Json<AmbulanceRoute>> {
    let route = state
        .dispatch
        .status()
        .update_route_status(&id, body.status)
        .await?;
    Ok(Json(route))
}
