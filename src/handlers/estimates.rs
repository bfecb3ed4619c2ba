use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::AppState;
use crate::pricing::models::{CostEstimate, EstimateRequest, EstimateResponse};
use crate::pricing::production::{ProductionEstimate, ProductionRequest};

/// Handle POST /api/estimates
pub async fn create_estimate(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>, AppError> {
    let Json(request) = payload?;
    let estimate = state.service.create_estimate(&request).await?;
    Ok(Json(estimate.into()))
}

/// Handle GET /api/estimates/:id
pub async fn get_estimate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CostEstimate>, AppError> {
    let id = parse_estimate_id(&id)?;
    Ok(Json(state.service.get_estimate(id).await?))
}

/// Handle GET /api/estimates/:id/report
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_estimate_id(&id)?;
    let report = state.service.report(id).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], report))
}

/// Handle POST /api/production-estimates
pub async fn production_estimate(
    State(state): State<AppState>,
    payload: Result<Json<ProductionRequest>, JsonRejection>,
) -> Result<Json<ProductionEstimate>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.service.production_estimate(&request).await?))
}

/// Malformed ids cannot name a stored estimate
fn parse_estimate_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::EstimateNotFound(id.to_string()))
}
