//! Command implementations for the CLI
//!
//! - start: Start the estimator server
//! - test: Test configuration validity
//! - config: Configuration display
//! - migrate / seed: Database schema and reference data
//! - estimate / report: One-off estimates and stored reports
//! - analyze: Planning calculators

pub mod analyze;
pub mod config;
pub mod estimate;
pub mod migrate;
pub mod report;
pub mod seed;
pub mod start;

use anyhow::Result;
use panel_cost_estimator::{config::Config, db, handlers::AppState, pricing::SqliteStore};

/// Open the configured database with migrations applied
async fn open_state(cfg: &Config) -> Result<AppState> {
    let pool = db::connect(&cfg.database.url, cfg.database.max_connections).await?;
    db::run_migrations(&pool).await?;
    Ok(AppState::new(SqliteStore::new(pool), cfg.estimates.validity()))
}
