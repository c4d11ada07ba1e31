//! Overview snapshot, dashboard configuration and section ordering

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use medinet_dashboard_core::{
    DashboardConfig, Direction, OverviewSnapshot, SectionLayout, SnapshotSource,
};
use serde::Deserialize;

use super::extract::{ApiJson, ApiPath};
use crate::error::ApiResult;
use crate::state::ConsoleState;

pub fn routes() -> Router<ConsoleState> {
    Router::new()
        .route("/api/dashboard/overview", get(overview))
        .route("/api/dashboard/config", get(get_config).put(update_config))
        .route("/api/dashboard/sections/:id/move", post(move_section))
        .route("/api/dashboard/sections/:id/visibility", post(set_visibility))
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityBody {
    pub visible: bool,
}

async fn overview(State(state): State<ConsoleState>) -> ApiResult<Json<OverviewSnapshot>> {
    Ok(Json(state.snapshot().await?))
}

async fn get_config(State(state): State<ConsoleState>) -> Json<DashboardConfig> {
    Json(state.dashboard.get())
}

async fn update_config(
    State(state): State<ConsoleState>,
    ApiJson(config): ApiJson<DashboardConfig>,
) -> ApiResult<Json<DashboardConfig>> {
    Ok(Json(state.dashboard.update(config)?))
}

async fn move_section(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<MoveBody>,
) -> ApiResult<Json<SectionLayout>> {
    Ok(Json(state.dashboard.move_section(&id, body.direction)?))
}

async fn set_visibility(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<VisibilityBody>,
) -> ApiResult<Json<SectionLayout>> {
    Ok(Json(state.dashboard.set_section_visible(&id, body.visible)?))
}
