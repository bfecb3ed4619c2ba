use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::AppState;
use crate::pricing::models::{
    MaterialRate, NewMaterialRate, NewProcessRate, Panel, ProcessRate, Supplier,
};
use crate::pricing::repository::RateHistoryQuery;
use crate::pricing::service::LeadTime;

#[derive(Debug, Deserialize)]
pub struct LeadTimeParams {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CompatibilityRequest {
    pub combinations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CompatibilityResponse {
    pub compatible: bool,
}

/// Handle GET /api/panels
pub async fn list_panels(State(state): State<AppState>) -> Result<Json<Vec<Panel>>, AppError> {
    Ok(Json(state.service.list_panels().await?))
}

/// Handle GET /api/suppliers
pub async fn list_suppliers(State(state): State<AppState>) -> Result<Json<Vec<Supplier>>, AppError> {
    Ok(Json(state.service.list_suppliers().await?))
}

/// Handle GET /api/suppliers/:id/lead-time?quantity=
pub async fn lead_time(
    State(state): State<AppState>,
    Path(supplier_id): Path<String>,
    params: Result<Query<LeadTimeParams>, QueryRejection>,
) -> Result<Json<LeadTime>, AppError> {
    let Query(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    Ok(Json(state.service.lead_time(&supplier_id, params.quantity).await?))
}

/// Handle POST /api/material-rates
pub async fn publish_material_rate(
    State(state): State<AppState>,
    payload: Result<Json<NewMaterialRate>, JsonRejection>,
) -> Result<Json<MaterialRate>, AppError> {
    let Json(rate) = payload?;
    Ok(Json(state.store.publish_material_rate(&rate).await?))
}

/// Handle POST /api/process-rates
pub async fn publish_process_rate(
    State(state): State<AppState>,
    payload: Result<Json<NewProcessRate>, JsonRejection>,
) -> Result<Json<ProcessRate>, AppError> {
    let Json(rate) = payload?;
    Ok(Json(state.store.publish_process_rate(&rate).await?))
}

/// Handle GET /api/material-rates/history?material=&grade=&from=&to=
pub async fn material_rate_history(
    State(state): State<AppState>,
    query: Result<Query<RateHistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<MaterialRate>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    Ok(Json(state.service.rate_history(&query).await?))
}

/// Handle POST /api/compatibility
pub async fn check_compatibility(
    State(state): State<AppState>,
    payload: Result<Json<CompatibilityRequest>, JsonRejection>,
) -> Result<Json<CompatibilityResponse>, AppError> {
    let Json(request) = payload?;
    let compatible = state.service.check_compatibility(&request.combinations).await?;
    Ok(Json(CompatibilityResponse { compatible }))
}
