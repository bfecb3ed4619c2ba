pub mod estimates;
pub mod health;
pub mod metrics_handler;
pub mod reference;

use crate::pricing::{EstimateService, SqliteStore};
use std::sync::Arc;

/// Shared state of the API routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EstimateService>,
    /// Direct store access for rate publishing and readiness probes
    pub store: Arc<SqliteStore>,
}

impl AppState {
    pub fn new(store: SqliteStore, validity: chrono::Duration) -> Self {
        let store = Arc::new(store);
        let service = EstimateService::new(store.clone(), store.clone(), validity);

        Self {
            service: Arc::new(service),
            store,
        }
    }
}
