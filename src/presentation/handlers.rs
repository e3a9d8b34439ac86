// HTTP request handlers
use crate::application::session::SessionSnapshot;
use crate::domain::axis_range::{PlotId, RelayoutEvent};
use crate::domain::feature::{Feature, SelectedFeatures};
use crate::infrastructure::http_response::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub struct FeatureOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Deserialize)]
pub struct RelayoutRequest {
    pub plot: PlotId,
    #[serde(default)]
    pub relayout: RelayoutEvent,
}

#[derive(Deserialize)]
pub struct LookbackRequest {
    #[serde(default)]
    pub hours: Value,
}

#[derive(Deserialize)]
pub struct FeaturesRequest {
    #[serde(default)]
    pub features: Vec<String>,
}

/// Whole-number lookback from whatever the number input sent; anything
/// else is treated as missing.
fn lookback_input(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Options for the feature picklist
pub async fn list_features() -> Json<Vec<FeatureOption>> {
    Json(
        Feature::ALL
            .iter()
            .map(|f| FeatureOption {
                value: f.id(),
                label: f.label(),
            })
            .collect(),
    )
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let snapshot = state.dashboard_service.create_session().await;
    (StatusCode::CREATED, Json(snapshot))
}

pub async fn get_session(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<SessionSnapshot> {
    Ok(Json(state.dashboard_service.snapshot(id).await?))
}

pub async fn close_session(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.dashboard_service.close_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Zoom/pan/autorange event from one of the plots
pub async fn relayout(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RelayoutRequest>,
) -> ApiResult<SessionSnapshot> {
    let snapshot = state
        .dashboard_service
        .relayout(id, request.plot, request.relayout)
        .await?;
    Ok(Json(snapshot))
}

pub async fn set_lookback(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<LookbackRequest>,
) -> ApiResult<SessionSnapshot> {
    let hours = lookback_input(&request.hours);
    Ok(Json(state.dashboard_service.set_lookback(id, hours).await?))
}

pub async fn set_features(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeaturesRequest>,
) -> ApiResult<SessionSnapshot> {
    let features = SelectedFeatures::from_ids(&request.features)?;
    Ok(Json(state.dashboard_service.set_features(id, features).await?))
}

pub async fn refresh(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<SessionSnapshot> {
    Ok(Json(state.dashboard_service.refresh(id).await?))
}

/// "Predict Next Step" button
pub async fn trigger_inference(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<SessionSnapshot> {
    Ok(Json(state.dashboard_service.trigger_inference(id).await?))
}
