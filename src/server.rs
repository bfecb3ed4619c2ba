use anyhow::Result;
use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    db,
    handlers::{self, AppState},
    metrics,
    pricing::SqliteStore,
    signals::setup_signal_handlers,
};

/// Request bodies are small JSON documents
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Start the cost estimator server
///
/// This function:
/// 1. Opens the database and applies migrations
/// 2. Initializes metrics (when enabled)
/// 3. Sets up signal handlers for graceful shutdown
/// 4. Binds to the configured address and serves until a shutdown signal
pub async fn start_server(config: Config) -> Result<()> {
    let pool = db::connect(&config.database.url, config.database.max_connections).await?;
    db::run_migrations(&pool).await?;

    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some(Arc::new(metrics::init_metrics()?))
    } else {
        None
    };

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let state = AppState::new(SqliteStore::new(pool.clone()), config.estimates.validity());
    let app = create_router(state, &config.metrics.endpoint, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting cost estimator on {}", addr);
    info!(
        database = %config.database.url,
        validity_days = config.estimates.validity_days,
        metrics = config.metrics.enabled,
        "Configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    pool.close().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    state: AppState,
    metrics_endpoint: &str,
    metrics_handle: Option<Arc<PrometheusHandle>>,
) -> Router {
    let api_routes = Router::new()
        .route("/api/estimates", post(handlers::estimates::create_estimate))
        .route("/api/estimates/:id", get(handlers::estimates::get_estimate))
        .route("/api/estimates/:id/report", get(handlers::estimates::get_report))
        .route(
            "/api/production-estimates",
            post(handlers::estimates::production_estimate),
        )
        .route("/api/panels", get(handlers::reference::list_panels))
        .route("/api/suppliers", get(handlers::reference::list_suppliers))
        .route(
            "/api/suppliers/:id/lead-time",
            get(handlers::reference::lead_time),
        )
        .route(
            "/api/material-rates",
            post(handlers::reference::publish_material_rate),
        )
        .route(
            "/api/material-rates/history",
            get(handlers::reference::material_rate_history),
        )
        .route(
            "/api/process-rates",
            post(handlers::reference::publish_process_rate),
        )
        .route(
            "/api/compatibility",
            post(handlers::reference::check_compatibility),
        )
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state);

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(api_routes);

    if let Some(handle) = metrics_handle {
        app = app.merge(
            Router::new()
                .route(metrics_endpoint, get(handlers::metrics_handler::metrics))
                .with_state(handle),
        );
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let pool = db::connect_in_memory().await.unwrap();
        crate::seed::seed_reference_data(&pool).await.unwrap();
        let state = AppState::new(SqliteStore::new(pool), chrono::Duration::days(30));
        create_router(state, "/metrics", None)
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = test_router().await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let app = test_router().await;

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_route_on_custom_endpoint() {
        let pool = db::connect_in_memory().await.unwrap();
        let state = AppState::new(SqliteStore::new(pool), chrono::Duration::days(30));
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let app = create_router(state, "/internal/metrics", Some(Arc::new(handle)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/internal/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = test_router().await;
        let body = format!(r#"{{"padding": "{}"}}"#, "x".repeat(MAX_BODY_BYTES + 1));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/estimates")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
