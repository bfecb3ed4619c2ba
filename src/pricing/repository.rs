//! Storage seams of the estimator.
//!
//! `ReferenceDataStore` is the read side (panels, suppliers, rates) and
//! `EstimateSink` records finished estimates. Both return plain value records;
//! `SqliteStore` implements them against the service database.

use crate::error::AppError;
use crate::pricing::models::{
    CostEstimate, MaterialGrade, MaterialRate, MaterialType, NewEstimate, Panel, ProcessRate,
    Supplier,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Filter for the material price history
#[derive(Debug, Clone, Deserialize)]
pub struct RateHistoryQuery {
    pub material: MaterialType,
    pub grade: MaterialGrade,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[async_trait]
pub trait ReferenceDataStore: Send + Sync {
    /// Active panel with the given name
    async fn find_active_panel(&self, name: &str) -> Result<Option<Panel>, AppError>;

    /// Supplier with its currently active discount tiers
    async fn find_supplier(&self, id: &str) -> Result<Option<Supplier>, AppError>;

    /// Open material rates for a grade and supplier, newest first
    async fn find_material_rates(
        &self,
        grade: MaterialGrade,
        supplier_id: &str,
    ) -> Result<Vec<MaterialRate>, AppError>;

    /// Open process rates for every process type
    async fn find_active_process_rates(&self) -> Result<Vec<ProcessRate>, AppError>;

    async fn list_active_panels(&self) -> Result<Vec<Panel>, AppError>;

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError>;

    /// Rate versions whose validity starts inside the requested range, oldest first
    async fn material_rate_history(
        &self,
        query: &RateHistoryQuery,
    ) -> Result<Vec<MaterialRate>, AppError>;

    /// Whether an active rule marks the ordered pair as compatible
    async fn is_compatible(
        &self,
        primary: MaterialType,
        secondary: MaterialType,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait EstimateSink: Send + Sync {
    /// Persist a new estimate, assigning its id and creation timestamp
    async fn create_estimate(&self, estimate: NewEstimate) -> Result<CostEstimate, AppError>;

    async fn find_estimate(&self, id: Uuid) -> Result<Option<CostEstimate>, AppError>;
}
