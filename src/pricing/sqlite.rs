use crate::error::AppError;
use crate::pricing::discount::{DiscountSchedule, DiscountTier};
use crate::pricing::models::{
    CostEstimate, MaterialGrade, MaterialRate, MaterialType, NewEstimate, NewMaterialRate,
    NewProcessRate, Panel, ProcessRate, Supplier, ValidityWindow,
};
use crate::pricing::repository::{EstimateSink, RateHistoryQuery, ReferenceDataStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Reference data store and estimate sink backed by the service database
#[derive(Clone)]
pub struct SqliteStore {
    db_pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PanelRow {
    name: String,
    width_mm: f64,
    height_mm: f64,
    active: i64,
}

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: String,
    name: String,
    kind: String,
    cost_multiplier: f64,
    lead_time_days: i64,
    min_order_value: f64,
}

#[derive(sqlx::FromRow)]
struct DiscountRow {
    supplier_id: String,
    min_quantity: i64,
    discount: f64,
}

#[derive(sqlx::FromRow)]
struct MaterialRateRow {
    material_type: String,
    grade: String,
    supplier_id: String,
    base_price: f64,
    unit: String,
    wastage_rate: f64,
    minimum_order: f64,
    lead_time_days: i64,
    valid_from: i64,
    valid_to: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ProcessRateRow {
    process_type: String,
    base_rate: f64,
    setup_cost: f64,
    currency: String,
    valid_from: i64,
    valid_to: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct EstimateRow {
    id: String,
    quantity: i64,
    panel_size: String,
    material_grade: String,
    supplier_id: String,
    supplier_name: String,
    lead_time_days: i64,
    material_costs: String,
    missing_materials: String,
    processing_cost: f64,
    discount: f64,
    total_cost: f64,
    unit_cost: f64,
    status: String,
    created_at: i64,
    valid_until: i64,
}

const MATERIAL_RATE_COLUMNS: &str = "material_type, grade, supplier_id, base_price, unit, \
     wastage_rate, minimum_order, lead_time_days, valid_from, valid_to";

impl SqliteStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    /// Number of persisted estimates
    pub async fn count_estimates(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cost_estimates")
            .fetch_one(&self.db_pool)
            .await?;
        Ok(count)
    }

    /// Publish a material rate, closing the currently open one for the same
    /// (material, grade, supplier) in the same transaction.
    pub async fn publish_material_rate(&self, rate: &NewMaterialRate) -> Result<MaterialRate, AppError> {
        if !(rate.base_price.is_finite() && rate.base_price >= 0.0) {
            return Err(AppError::InvalidRequest("basePrice must be a non-negative number".to_string()));
        }
        if !(rate.wastage_rate.is_finite() && rate.wastage_rate >= 0.0) {
            return Err(AppError::InvalidRequest("wastageRate must be a non-negative number".to_string()));
        }

        // Take the write lock up front so concurrent publishers queue on the busy timeout
        let mut tx = self.db_pool.begin_with("BEGIN IMMEDIATE").await?;
        let now = now_millis();

        let supplier_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM suppliers WHERE id = ?")
            .bind(&rate.supplier_id)
            .fetch_one(&mut *tx)
            .await?;
        if supplier_exists == 0 {
            return Err(AppError::InvalidSupplier(rate.supplier_id.clone()));
        }

        let closed = sqlx::query(
            r#"
            UPDATE material_rates
            SET valid_to = ?
            WHERE supplier_id = ? AND material_type = ? AND grade = ? AND valid_to IS NULL
            "#,
        )
        .bind(now)
        .bind(&rate.supplier_id)
        .bind(rate.material_type.as_str())
        .bind(rate.grade.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO material_rates (
                supplier_id, material_type, grade, base_price, unit,
                wastage_rate, minimum_order, lead_time_days, valid_from
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rate.supplier_id)
        .bind(rate.material_type.as_str())
        .bind(rate.grade.as_str())
        .bind(rate.base_price)
        .bind(&rate.unit)
        .bind(rate.wastage_rate)
        .bind(rate.minimum_order)
        .bind(i64::from(rate.lead_time_days))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            material = %rate.material_type,
            grade = %rate.grade,
            supplier = %rate.supplier_id,
            base_price = rate.base_price,
            superseded = closed,
            "Published material rate"
        );

        Ok(MaterialRate {
            material_type: rate.material_type,
            grade: rate.grade,
            supplier_id: rate.supplier_id.clone(),
            base_price: rate.base_price,
            unit: rate.unit.clone(),
            wastage_rate: rate.wastage_rate,
            minimum_order: rate.minimum_order,
            lead_time_days: rate.lead_time_days,
            validity: ValidityWindow::open_from(from_millis(now)?),
        })
    }

    /// Publish a process rate, closing the open one for the same process type
    pub async fn publish_process_rate(&self, rate: &NewProcessRate) -> Result<ProcessRate, AppError> {
        if rate.process_type.trim().is_empty() {
            return Err(AppError::InvalidRequest("processType must not be empty".to_string()));
        }
        if !(rate.base_rate >= 0.0 && rate.setup_cost >= 0.0) {
            return Err(AppError::InvalidRequest("process rates must be non-negative".to_string()));
        }

        let mut tx = self.db_pool.begin_with("BEGIN IMMEDIATE").await?;
        let now = now_millis();

        sqlx::query("UPDATE process_rates SET valid_to = ? WHERE process_type = ? AND valid_to IS NULL")
            .bind(now)
            .bind(&rate.process_type)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO process_rates (process_type, base_rate, setup_cost, currency, valid_from)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rate.process_type)
        .bind(rate.base_rate)
        .bind(rate.setup_cost)
        .bind(&rate.currency)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(process = %rate.process_type, base_rate = rate.base_rate, "Published process rate");

        Ok(ProcessRate {
            process_type: rate.process_type.clone(),
            base_rate: rate.base_rate,
            setup_cost: rate.setup_cost,
            currency: rate.currency.clone(),
            validity: ValidityWindow::open_from(from_millis(now)?),
        })
    }

    async fn load_discount_tiers(&self, supplier_id: Option<&str>) -> Result<Vec<DiscountRow>, AppError> {
        let rows = match supplier_id {
            Some(id) => {
                sqlx::query_as::<_, DiscountRow>(
                    r#"
                    SELECT supplier_id, min_quantity, discount
                    FROM bulk_discounts
                    WHERE supplier_id = ? AND valid_to IS NULL
                    ORDER BY min_quantity ASC, id ASC
                    "#,
                )
                .bind(id)
                .fetch_all(&self.db_pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DiscountRow>(
                    r#"
                    SELECT supplier_id, min_quantity, discount
                    FROM bulk_discounts
                    WHERE valid_to IS NULL
                    ORDER BY supplier_id, min_quantity ASC, id ASC
                    "#,
                )
                .fetch_all(&self.db_pool)
                .await?
            }
        };
        Ok(rows)
    }
}

#[async_trait]
impl ReferenceDataStore for SqliteStore {
    async fn find_active_panel(&self, name: &str) -> Result<Option<Panel>, AppError> {
        let row = sqlx::query_as::<_, PanelRow>(
            r#"
            SELECT name, width_mm, height_mm, active
            FROM panel_sizes
            WHERE name = ? AND active = 1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(row.map(Panel::from))
    }

    async fn find_supplier(&self, id: &str) -> Result<Option<Supplier>, AppError> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, name, kind, cost_multiplier, lead_time_days, min_order_value
            FROM suppliers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tiers = self.load_discount_tiers(Some(id)).await?;
        supplier_from_row(row, tiers).map(Some)
    }

    async fn find_material_rates(
        &self,
        grade: MaterialGrade,
        supplier_id: &str,
    ) -> Result<Vec<MaterialRate>, AppError> {
        let rows = sqlx::query_as::<_, MaterialRateRow>(&format!(
            r#"
            SELECT {MATERIAL_RATE_COLUMNS}
            FROM material_rates
            WHERE grade = ? AND supplier_id = ? AND valid_to IS NULL
            ORDER BY valid_from DESC, id DESC
            "#
        ))
        .bind(grade.as_str())
        .bind(supplier_id)
        .fetch_all(&self.db_pool)
        .await?;

        debug!(grade = %grade, supplier = supplier_id, count = rows.len(), "Loaded material rates");
        rows.into_iter().map(MaterialRate::try_from).collect()
    }

    async fn find_active_process_rates(&self) -> Result<Vec<ProcessRate>, AppError> {
        let rows = sqlx::query_as::<_, ProcessRateRow>(
            r#"
            SELECT process_type, base_rate, setup_cost, currency, valid_from, valid_to
            FROM process_rates
            WHERE valid_to IS NULL
            ORDER BY process_type, valid_from DESC, id DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        // One current rate per process type: the newest
        let mut seen = HashSet::new();
        rows.into_iter()
            .filter(|row| seen.insert(row.process_type.clone()))
            .map(ProcessRate::try_from)
            .collect()
    }

    async fn list_active_panels(&self) -> Result<Vec<Panel>, AppError> {
        let rows = sqlx::query_as::<_, PanelRow>(
            r#"
            SELECT name, width_mm, height_mm, active
            FROM panel_sizes
            WHERE active = 1
            ORDER BY width_mm * height_mm ASC, name ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows.into_iter().map(Panel::from).collect())
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let rows = sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, name, kind, cost_multiplier, lead_time_days, min_order_value
            FROM suppliers
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let mut tiers_by_supplier: HashMap<String, Vec<DiscountRow>> = HashMap::new();
        for tier in self.load_discount_tiers(None).await? {
            tiers_by_supplier
                .entry(tier.supplier_id.clone())
                .or_default()
                .push(tier);
        }

        rows.into_iter()
            .map(|row| {
                let tiers = tiers_by_supplier.remove(&row.id).unwrap_or_default();
                supplier_from_row(row, tiers)
            })
            .collect()
    }

    async fn material_rate_history(
        &self,
        query: &RateHistoryQuery,
    ) -> Result<Vec<MaterialRate>, AppError> {
        let rows = sqlx::query_as::<_, MaterialRateRow>(&format!(
            r#"
            SELECT {MATERIAL_RATE_COLUMNS}
            FROM material_rates
            WHERE material_type = ? AND grade = ? AND valid_from >= ? AND valid_from <= ?
            ORDER BY valid_from ASC, id ASC
            "#
        ))
        .bind(query.material.as_str())
        .bind(query.grade.as_str())
        .bind(query.from.timestamp_millis())
        .bind(query.to.timestamp_millis())
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter().map(MaterialRate::try_from).collect()
    }

    async fn is_compatible(
        &self,
        primary: MaterialType,
        secondary: MaterialType,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM material_compatibility
            WHERE primary_material = ? AND secondary_material = ?
              AND compatible = 1 AND valid_to IS NULL
            "#,
        )
        .bind(primary.as_str())
        .bind(secondary.as_str())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(count > 0)
    }
}

#[async_trait]
impl EstimateSink for SqliteStore {
    async fn create_estimate(&self, estimate: NewEstimate) -> Result<CostEstimate, AppError> {
        let id = Uuid::new_v4();
        let created_at = from_millis(now_millis())?;
        let valid_until = created_at
            .checked_add_signed(estimate.valid_for)
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "estimate validity of {} days overflows the timestamp range",
                    estimate.valid_for.num_days()
                ))
            })?;

        let material_costs = estimate.computation.materials.costs;
        let missing_materials = estimate.computation.materials.missing;

        sqlx::query(
            r#"
            INSERT INTO cost_estimates (
                id, quantity, panel_size, material_grade, supplier_id, supplier_name,
                lead_time_days, material_costs, missing_materials, processing_cost,
                discount, total_cost, unit_cost, status, created_at, valid_until
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(i64::from(estimate.quantity))
        .bind(&estimate.panel_size)
        .bind(estimate.material_grade.as_str())
        .bind(&estimate.supplier_id)
        .bind(&estimate.supplier_name)
        .bind(i64::from(estimate.lead_time_days))
        .bind(serde_json::to_string(&material_costs)?)
        .bind(serde_json::to_string(&missing_materials)?)
        .bind(estimate.computation.processing_cost)
        .bind(estimate.computation.discount)
        .bind(estimate.computation.total_cost)
        .bind(estimate.computation.unit_cost)
        .bind(&estimate.status)
        .bind(created_at.timestamp_millis())
        .bind(valid_until.timestamp_millis())
        .execute(&self.db_pool)
        .await?;

        Ok(CostEstimate {
            id,
            quantity: estimate.quantity,
            panel_size: estimate.panel_size,
            material_grade: estimate.material_grade,
            supplier_id: estimate.supplier_id,
            supplier_name: estimate.supplier_name,
            lead_time_days: estimate.lead_time_days,
            material_costs,
            missing_materials,
            processing_cost: estimate.computation.processing_cost,
            discount: estimate.computation.discount,
            total_cost: estimate.computation.total_cost,
            unit_cost: estimate.computation.unit_cost,
            status: estimate.status,
            created_at,
            valid_until,
        })
    }

    async fn find_estimate(&self, id: Uuid) -> Result<Option<CostEstimate>, AppError> {
        let row = sqlx::query_as::<_, EstimateRow>(
            r#"
            SELECT id, quantity, panel_size, material_grade, supplier_id, supplier_name,
                   lead_time_days, material_costs, missing_materials, processing_cost,
                   discount, total_cost, unit_cost, status, created_at, valid_until
            FROM cost_estimates
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db_pool)
        .await?;

        row.map(CostEstimate::try_from).transpose()
    }
}

impl From<PanelRow> for Panel {
    fn from(row: PanelRow) -> Self {
        Self {
            name: row.name,
            width_mm: row.width_mm,
            height_mm: row.height_mm,
            active: row.active != 0,
        }
    }
}

impl TryFrom<MaterialRateRow> for MaterialRate {
    type Error = AppError;

    fn try_from(row: MaterialRateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            material_type: parse_stored(&row.material_type, "material_rates.material_type")?,
            grade: parse_stored(&row.grade, "material_rates.grade")?,
            supplier_id: row.supplier_id,
            base_price: row.base_price,
            unit: row.unit,
            wastage_rate: row.wastage_rate,
            minimum_order: row.minimum_order,
            lead_time_days: to_u32(row.lead_time_days, "material_rates.lead_time_days")?,
            validity: validity(row.valid_from, row.valid_to)?,
        })
    }
}

impl TryFrom<ProcessRateRow> for ProcessRate {
    type Error = AppError;

    fn try_from(row: ProcessRateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            process_type: row.process_type,
            base_rate: row.base_rate,
            setup_cost: row.setup_cost,
            currency: row.currency,
            validity: validity(row.valid_from, row.valid_to)?,
        })
    }
}

impl TryFrom<EstimateRow> for CostEstimate {
    type Error = AppError;

    fn try_from(row: EstimateRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| AppError::DataIntegrity(format!("cost_estimates.id '{}': {}", row.id, e)))?;
        let material_costs: BTreeMap<MaterialType, f64> = serde_json::from_str(&row.material_costs)?;
        let missing_materials: Vec<MaterialType> = serde_json::from_str(&row.missing_materials)?;

        Ok(Self {
            id,
            quantity: to_u32(row.quantity, "cost_estimates.quantity")?,
            panel_size: row.panel_size,
            material_grade: parse_stored(&row.material_grade, "cost_estimates.material_grade")?,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            lead_time_days: to_u32(row.lead_time_days, "cost_estimates.lead_time_days")?,
            material_costs,
            missing_materials,
            processing_cost: row.processing_cost,
            discount: row.discount,
            total_cost: row.total_cost,
            unit_cost: row.unit_cost,
            status: row.status,
            created_at: from_millis(row.created_at)?,
            valid_until: from_millis(row.valid_until)?,
        })
    }
}

fn supplier_from_row(row: SupplierRow, tiers: Vec<DiscountRow>) -> Result<Supplier, AppError> {
    let tiers = tiers
        .into_iter()
        .map(|t| {
            Ok(DiscountTier {
                min_quantity: to_u32(t.min_quantity, "bulk_discounts.min_quantity")?,
                discount: t.discount,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Supplier {
        lead_time_days: to_u32(row.lead_time_days, "suppliers.lead_time_days")?,
        id: row.id,
        name: row.name,
        kind: row.kind,
        cost_multiplier: row.cost_multiplier,
        min_order_value: row.min_order_value,
        discount_tiers: DiscountSchedule::new(tiers),
    })
}

fn parse_stored<T>(value: &str, column: &str) -> Result<T, AppError>
where
    T: FromStr<Err = AppError>,
{
    value
        .parse()
        .map_err(|e: AppError| AppError::DataIntegrity(format!("{}: {}", column, e)))
}

fn to_u32(value: i64, column: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::DataIntegrity(format!("{} out of range: {}", column, value)))
}

fn validity(valid_from: i64, valid_to: Option<i64>) -> Result<ValidityWindow, AppError> {
    Ok(ValidityWindow {
        valid_from: from_millis(valid_from)?,
        valid_to: valid_to.map(from_millis).transpose()?,
    })
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AppError::DataIntegrity(format!("timestamp out of range: {}", ms)))
}
