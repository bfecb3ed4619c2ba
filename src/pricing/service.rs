use crate::error::AppError;
use crate::metrics;
use crate::pricing::calculator;
use crate::pricing::models::{
    CostEstimate, EstimateRequest, MaterialRate, NewEstimate, Panel, Supplier, DRAFT_STATUS,
};
use crate::pricing::production::{self, ProductionEstimate, ProductionRequest};
use crate::pricing::report;
use crate::pricing::repository::{EstimateSink, RateHistoryQuery, ReferenceDataStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Quantity-adjusted lead time of one supplier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadTime {
    pub supplier_id: String,
    pub quantity: u32,
    pub lead_time_days: u32,
}

/// Cost estimation service: resolves reference data, runs the computation
/// and records the resulting quote.
pub struct EstimateService {
    reference: Arc<dyn ReferenceDataStore>,
    sink: Arc<dyn EstimateSink>,
    validity: chrono::Duration,
}

impl EstimateService {
    pub fn new(
        reference: Arc<dyn ReferenceDataStore>,
        sink: Arc<dyn EstimateSink>,
        validity: chrono::Duration,
    ) -> Self {
        Self {
            reference,
            sink,
            validity,
        }
    }

    /// Compute and persist a new draft estimate.
    ///
    /// All lookups happen before the single write, so a failed lookup leaves
    /// no record behind.
    pub async fn create_estimate(&self, request: &EstimateRequest) -> Result<CostEstimate, AppError> {
        let started = Instant::now();
        let result = self.create_estimate_inner(request).await;

        match &result {
            Ok(estimate) => metrics::record_estimate(
                estimate.material_grade.as_str(),
                &estimate.supplier_id,
                estimate.total_cost,
                started.elapsed(),
            ),
            Err(e) => metrics::record_estimate_error(e.error_type()),
        }

        result
    }

    async fn create_estimate_inner(&self, request: &EstimateRequest) -> Result<CostEstimate, AppError> {
        let quantity = validate_quantity(request.quantity)?;
        let panel = self.resolve_panel(&request.panel_size).await?;
        let supplier = self.resolve_supplier(&request.supplier_id).await?;

        let rates = self
            .reference
            .find_material_rates(request.material_grade, &supplier.id)
            .await?;
        let processes = self.reference.find_active_process_rates().await?;

        let area = panel.area_m2();
        let computation = calculator::compute(area, quantity, &supplier, &rates, &processes)?;

        if !computation.materials.missing.is_empty() {
            warn!(
                grade = %request.material_grade,
                supplier = %supplier.id,
                missing = ?computation.materials.missing,
                "No active rate for some materials"
            );
        }
        if computation.total_cost < supplier.min_order_value {
            warn!(
                supplier = %supplier.id,
                total_cost = computation.total_cost,
                min_order_value = supplier.min_order_value,
                "Estimate is below the supplier's minimum order value"
            );
        }

        debug!(
            area_m2 = area,
            subtotal = computation.subtotal,
            discount = computation.discount,
            "Computed estimate"
        );

        let estimate = self
            .sink
            .create_estimate(NewEstimate {
                quantity,
                panel_size: panel.name,
                material_grade: request.material_grade,
                supplier_id: supplier.id,
                supplier_name: supplier.name,
                lead_time_days: supplier.lead_time_days,
                computation,
                valid_for: self.validity,
                status: DRAFT_STATUS.to_string(),
            })
            .await?;

        info!(
            id = %estimate.id,
            quantity = estimate.quantity,
            panel = %estimate.panel_size,
            grade = %estimate.material_grade,
            supplier = %estimate.supplier_id,
            total_cost = estimate.total_cost,
            "Created cost estimate"
        );

        Ok(estimate)
    }

    pub async fn get_estimate(&self, id: Uuid) -> Result<CostEstimate, AppError> {
        self.sink
            .find_estimate(id)
            .await?
            .ok_or_else(|| AppError::EstimateNotFound(id.to_string()))
    }

    /// Plain-text report of a stored estimate
    pub async fn report(&self, id: Uuid) -> Result<String, AppError> {
        let estimate = self.get_estimate(id).await?;
        Ok(report::render_report(&estimate, Utc::now()))
    }

    pub async fn production_estimate(&self, request: &ProductionRequest) -> Result<ProductionEstimate, AppError> {
        let quantity = validate_quantity(request.quantity)?;
        let panel = self.resolve_panel(&request.panel_size).await?;
        Ok(production::production_estimate(panel.area_m2(), quantity))
    }

    pub async fn lead_time(&self, supplier_id: &str, quantity: i64) -> Result<LeadTime, AppError> {
        let quantity = validate_quantity(quantity)?;
        let supplier = self.resolve_supplier(supplier_id).await?;

        Ok(LeadTime {
            lead_time_days: production::adjusted_lead_time(supplier.lead_time_days, quantity),
            supplier_id: supplier.id,
            quantity,
        })
    }

    /// True only when every "primary-secondary" pair has an active compatible rule
    pub async fn check_compatibility(&self, combinations: &[String]) -> Result<bool, AppError> {
        let pairs = combinations
            .iter()
            .map(|c| production::parse_combination(c))
            .collect::<Result<Vec<_>, _>>()?;

        for (primary, secondary) in pairs {
            if !self.reference.is_compatible(primary, secondary).await? {
                debug!(%primary, %secondary, "Incompatible material pair");
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub async fn rate_history(&self, query: &RateHistoryQuery) -> Result<Vec<MaterialRate>, AppError> {
        if query.from > query.to {
            return Err(AppError::InvalidRequest("'from' must not be after 'to'".to_string()));
        }
        self.reference.material_rate_history(query).await
    }

    pub async fn list_panels(&self) -> Result<Vec<Panel>, AppError> {
        self.reference.list_active_panels().await
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.reference.list_suppliers().await
    }

    async fn resolve_panel(&self, name: &str) -> Result<Panel, AppError> {
        self.reference
            .find_active_panel(name)
            .await?
            .ok_or_else(|| AppError::InvalidPanelSize(name.to_string()))
    }

    async fn resolve_supplier(&self, id: &str) -> Result<Supplier, AppError> {
        self.reference
            .find_supplier(id)
            .await?
            .ok_or_else(|| AppError::InvalidSupplier(id.to_string()))
    }
}

fn validate_quantity(quantity: i64) -> Result<u32, AppError> {
    if quantity < 1 {
        return Err(AppError::InvalidRequest("quantity must be at least 1".to_string()));
    }
    u32::try_from(quantity)
        .map_err(|_| AppError::InvalidRequest(format!("quantity {} is too large", quantity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{MaterialGrade, MaterialType};
    use crate::pricing::sqlite::SqliteStore;
    use chrono::{Duration, Utc};

    async fn service() -> (EstimateService, SqliteStore) {
        let pool = crate::db::connect_in_memory().await.unwrap();
        crate::seed::seed_reference_data(&pool).await.unwrap();
        let store = SqliteStore::new(pool);
        let shared = Arc::new(store.clone());
        (
            EstimateService::new(shared.clone(), shared, Duration::days(30)),
            store,
        )
    }

    fn request(quantity: i64, panel: &str, supplier: &str) -> EstimateRequest {
        EstimateRequest {
            quantity,
            panel_size: panel.to_string(),
            material_grade: MaterialGrade::Standard,
            supplier_id: supplier.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_estimate_with_seeded_data() {
        let (service, store) = service().await;

        let estimate = service.create_estimate(&request(100, "500x500", "aspen")).await.unwrap();

        let materials = 3450.0 + 3750.0 + 5625.0 + 1237.5;
        let processing = (150.0 + 45.0 * 25.0 + 100.0 + 35.0 * 25.0 + 75.0 + 40.0 * 25.0) * 1.2;
        let total = (materials + processing) * 0.95;

        assert!((estimate.processing_cost - processing).abs() < 1e-6);
        assert!((estimate.total_cost - total).abs() < 1e-6);
        assert!((estimate.unit_cost * 100.0 - estimate.total_cost).abs() < 1e-6);
        assert_eq!(estimate.material_costs.len(), 4);
        assert!(estimate.missing_materials.is_empty());
        assert_eq!(estimate.status, "draft");
        assert_eq!(estimate.supplier_name, "Aspen Aerogels");
        assert_eq!(estimate.lead_time_days, 14);
        assert_eq!(estimate.valid_until - estimate.created_at, Duration::days(30));
        assert_eq!(store.count_estimates().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_panel_creates_nothing() {
        let (service, store) = service().await;

        let err = service
            .create_estimate(&request(100, "123x456", "aspen"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPanelSize(_)));
        assert_eq!(store.count_estimates().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_supplier_creates_nothing() {
        let (service, store) = service().await;

        let err = service
            .create_estimate(&request(100, "500x500", "acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSupplier(_)));
        assert_eq!(store.count_estimates().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_is_rejected() {
        let (service, store) = service().await;

        for quantity in [0, -5] {
            let err = service
                .create_estimate(&request(quantity, "500x500", "aspen"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
        assert_eq!(store.count_estimates().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_rate_is_reported_not_synthesized() {
        let (service, store) = service().await;
        sqlx::query("DELETE FROM material_rates WHERE material_type = 'titanium'")
            .execute(store.pool())
            .await
            .unwrap();

        let estimate = service.create_estimate(&request(10, "500x500", "morgan")).await.unwrap();
        assert_eq!(estimate.missing_materials, vec![MaterialType::Titanium]);
        assert!(!estimate.material_costs.contains_key(&MaterialType::Titanium));
    }

    #[tokio::test]
    async fn test_estimate_uses_rates_active_at_creation() {
        let (service, store) = service().await;

        let before = service.create_estimate(&request(100, "500x500", "aspen")).await.unwrap();
        sqlx::query("UPDATE material_rates SET base_price = base_price * 10")
            .execute(store.pool())
            .await
            .unwrap();

        let stored = service.get_estimate(before.id).await.unwrap();
        assert_eq!(stored.total_cost, before.total_cost);
    }

    #[tokio::test]
    async fn test_get_unknown_estimate() {
        let (service, _) = service().await;
        let err = service.get_estimate(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::EstimateNotFound(_)));
    }

    #[tokio::test]
    async fn test_report_for_stored_estimate() {
        let (service, _) = service().await;
        let estimate = service.create_estimate(&request(100, "500x500", "aspen")).await.unwrap();

        let text = service.report(estimate.id).await.unwrap();
        assert!(text.contains("polyimide: $3450.00"));
        assert!(text.contains("Lead Time: 14 days"));
    }

    #[tokio::test]
    async fn test_lead_time_for_large_order() {
        let (service, _) = service().await;

        let lead = service.lead_time("morgan", 1200).await.unwrap();
        assert_eq!(lead.lead_time_days, 35);
        assert!(service.lead_time("acme", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_compatibility_requires_every_pair() {
        let (service, _) = service().await;

        let ok = vec!["polyimide-aerogel".to_string(), "titanium-polyimide".to_string()];
        assert!(service.check_compatibility(&ok).await.unwrap());

        let mixed = vec!["polyimide-aerogel".to_string(), "aerogel-titanium".to_string()];
        assert!(!service.check_compatibility(&mixed).await.unwrap());

        let malformed = vec!["polyimide".to_string()];
        assert!(service.check_compatibility(&malformed).await.is_err());
    }

    #[tokio::test]
    async fn test_rate_history_range_is_validated() {
        let (service, _) = service().await;
        let now = Utc::now();

        let err = service
            .rate_history(&RateHistoryQuery {
                material: MaterialType::Aerogel,
                grade: MaterialGrade::Premium,
                from: now,
                to: now - Duration::days(1),
            })
            .await
            .unwrap_err();
        assert!(err.is_client_error());

        let history = service
            .rate_history(&RateHistoryQuery {
                material: MaterialType::Aerogel,
                grade: MaterialGrade::Premium,
                from: now - Duration::days(1),
                to: now + Duration::days(1),
            })
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_production_estimate_resolves_panel() {
        let (service, _) = service().await;

        let plan = service
            .production_estimate(&ProductionRequest {
                quantity: 10,
                panel_size: "1000x1000".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(plan.production_time, 5.0);
        assert_eq!(plan.material_requirements[&MaterialType::Polyimide], 2.0);
    }
}
