//! Alerts, alert templates, metric evaluation and notification settings

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use medinet_alerts_core::{
    Alert, AlertFilter, AlertTemplate, Channel, MetricReading, NewAlert, NotificationSettings,
    TemplateDraft,
};
use serde::Deserialize;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::ApiResult;
use crate::state::ConsoleState;

pub fn routes() -> Router<ConsoleState> {
    Router::new()
        .route("/api/alerts", get(list_alerts).post(raise_alert))
        .route("/api/alerts/:id", get(get_alert))
        .route("/api/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/api/alerts/:id/resolve", post(resolve_alert))
        .route("/api/alerts/:id/dismiss", post(dismiss_alert))
        .route(
            "/api/alert-templates",
            get(list_templates).post(create_template),
        )
        .route(
            "/api/alert-templates/:id",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route("/api/metrics", post(evaluate_metric))
        .route(
            "/api/notification-settings",
            get(get_settings).put(update_settings),
        )
        .route(
            "/api/notification-settings/channels/:channel/toggle",
            post(toggle_channel),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct AcknowledgeBody {
    pub by: Option<String>,
}

async fn list_alerts(
    State(state): State<ConsoleState>,
    ApiQuery(filter): ApiQuery<AlertFilter>,
) -> ApiResult<Json<Vec<Alert>>> {
    Ok(Json(state.alerts.list_alerts(&filter).await?))
}

async fn raise_alert(
    State(state): State<ConsoleState>,
    ApiJson(new): ApiJson<NewAlert>,
) -> ApiResult<(StatusCode, Json<Alert>)> {
    let alert = state.alerts.raise(new).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

async fn get_alert(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Alert>> {
    Ok(Json(state.alerts.get_alert(&id).await?))
}

async fn acknowledge_alert(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
    body: Option<ApiJson<AcknowledgeBody>>,
) -> ApiResult<Json<Alert>> {
    let by = body.and_then(|ApiJson(body)| body.by);
    Ok(Json(state.alerts.acknowledge(&id, by).await?))
}

async fn resolve_alert(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Alert>> {
    Ok(Json(state.alerts.resolve(&id).await?))
}

async fn dismiss_alert(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Alert>> {
    Ok(Json(state.alerts.dismiss(&id).await?))
}

async fn list_templates(State(state): State<ConsoleState>) -> ApiResult<Json<Vec<AlertTemplate>>> {
    Ok(Json(state.alerts.list_templates().await?))
}

async fn create_template(
    State(state): State<ConsoleState>,
    ApiJson(draft): ApiJson<TemplateDraft>,
) -> ApiResult<(StatusCode, Json<AlertTemplate>)> {
    let template = state.alerts.create_template(draft).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_template(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<AlertTemplate>> {
    Ok(Json(state.alerts.get_template(&id).await?))
}

async fn update_template(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(draft): ApiJson<TemplateDraft>,
) -> ApiResult<Json<AlertTemplate>> {
    Ok(Json(state.alerts.update_template(&id, draft).await?))
}

async fn delete_template(
    State(state): State<ConsoleState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.alerts.delete_template(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fired alerts, possibly none
async fn evaluate_metric(
    State(state): State<ConsoleState>,
    ApiJson(reading): ApiJson<MetricReading>,
) -> ApiResult<Json<Vec<Alert>>> {
    Ok(Json(state.alerts.evaluate(&reading).await?))
}

async fn get_settings(State(state): State<ConsoleState>) -> Json<NotificationSettings> {
    Json(state.alerts.settings())
}

async fn update_settings(
    State(state): State<ConsoleState>,
    ApiJson(settings): ApiJson<NotificationSettings>,
) -> ApiResult<Json<NotificationSettings>> {
    Ok(Json(state.alerts.update_settings(settings)?))
}

async fn toggle_channel(
    State(state): State<ConsoleState>,
    ApiPath(channel): ApiPath<String>,
) -> ApiResult<Json<NotificationSettings>> {
    let channel: Channel = channel.parse()?;
    Ok(Json(state.alerts.toggle_channel(channel)))
}
