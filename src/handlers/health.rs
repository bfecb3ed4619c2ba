use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::handlers::AppState;

/// Health check endpoint
/// Returns 200 OK if the service is running
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "service": "cost-estimator",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Readiness check endpoint
/// Returns 200 OK once the database answers, 503 otherwise
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.store.pool()).await {
        Ok(_) => (StatusCode::OK, Json(json!({
            "status": "ready",
            "service": "cost-estimator",
        }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({
                "status": "unavailable",
                "service": "cost-estimator",
            })))
        }
    }
}
