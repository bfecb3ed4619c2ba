use crate::error::AppError;
use crate::pricing::discount::DiscountSchedule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Status tag stamped on every newly created estimate
pub const DRAFT_STATUS: &str = "draft";

/// Materials that make up a composite panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    Polyimide,
    Aerogel,
    Titanium,
    Adhesive,
}

impl MaterialType {
    pub const ALL: [MaterialType; 4] = [
        MaterialType::Polyimide,
        MaterialType::Aerogel,
        MaterialType::Titanium,
        MaterialType::Adhesive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polyimide => "polyimide",
            Self::Aerogel => "aerogel",
            Self::Titanium => "titanium",
            Self::Adhesive => "adhesive",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polyimide" => Ok(Self::Polyimide),
            "aerogel" => Ok(Self::Aerogel),
            "titanium" => Ok(Self::Titanium),
            "adhesive" => Ok(Self::Adhesive),
            other => Err(AppError::InvalidRequest(format!("unknown material type '{}'", other))),
        }
    }
}

/// Material quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialGrade {
    Standard,
    Premium,
}

impl MaterialGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for MaterialGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialGrade {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            other => Err(AppError::InvalidRequest(format!("unknown material grade '{}'", other))),
        }
    }
}

/// Effective-time range of a reference row. Open-ended when `valid_to` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    pub fn open_from(valid_from: DateTime<Utc>) -> Self {
        Self {
            valid_from,
            valid_to: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }
}

/// Panel size reference record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub name: String,
    pub width_mm: f64,
    pub height_mm: f64,
    pub active: bool,
}

impl Panel {
    /// Panel area in m²
    pub fn area_m2(&self) -> f64 {
        self.width_mm * self.height_mm / 1_000_000.0
    }
}

/// Unit price of one material for a grade and supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRate {
    pub material_type: MaterialType,
    pub grade: MaterialGrade,
    pub supplier_id: String,
    pub base_price: f64,
    pub unit: String,
    pub wastage_rate: f64,
    pub minimum_order: f64,
    pub lead_time_days: u32,
    #[serde(flatten)]
    pub validity: ValidityWindow,
}

/// Hourly rate and fixed setup cost of a manufacturing process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRate {
    pub process_type: String,
    pub base_rate: f64,
    pub setup_cost: f64,
    pub currency: String,
    #[serde(flatten)]
    pub validity: ValidityWindow,
}

/// New material rate version to publish; it supersedes the open rate for
/// the same (material, grade, supplier).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterialRate {
    pub material_type: MaterialType,
    pub grade: MaterialGrade,
    pub supplier_id: String,
    pub base_price: f64,
    pub unit: String,
    #[serde(default)]
    pub wastage_rate: f64,
    #[serde(default)]
    pub minimum_order: f64,
    #[serde(default)]
    pub lead_time_days: u32,
}

/// New process rate version to publish
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcessRate {
    pub process_type: String,
    pub base_rate: f64,
    pub setup_cost: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Supplier with its currently active discount tiers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub cost_multiplier: f64,
    pub lead_time_days: u32,
    pub min_order_value: f64,
    pub discount_tiers: DiscountSchedule,
}

/// Per-material costs of one estimate. Materials without a rate are listed
/// in `missing` and never appear in `costs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialCostBreakdown {
    pub costs: BTreeMap<MaterialType, f64>,
    pub missing: Vec<MaterialType>,
}

impl MaterialCostBreakdown {
    pub fn total(&self) -> f64 {
        self.costs.values().sum()
    }
}

/// Result of the pure cost computation, before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct CostComputation {
    pub materials: MaterialCostBreakdown,
    pub processing_cost: f64,
    pub discount: f64,
    pub subtotal: f64,
    pub total_cost: f64,
    pub unit_cost: f64,
}

/// Incoming estimate request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub quantity: i64,
    pub panel_size: String,
    pub material_grade: MaterialGrade,
    pub supplier_id: String,
}

/// Estimate about to be written to the sink. The sink assigns the id and
/// creation time; `valid_until` is `created_at + valid_for`.
#[derive(Debug, Clone)]
pub struct NewEstimate {
    pub quantity: u32,
    pub panel_size: String,
    pub material_grade: MaterialGrade,
    pub supplier_id: String,
    pub supplier_name: String,
    pub lead_time_days: u32,
    pub computation: CostComputation,
    pub valid_for: chrono::Duration,
    pub status: String,
}

/// Persisted, write-once estimate snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub id: Uuid,
    pub quantity: u32,
    pub panel_size: String,
    pub material_grade: MaterialGrade,
    pub supplier_id: String,
    pub supplier_name: String,
    pub lead_time_days: u32,
    pub material_costs: BTreeMap<MaterialType, f64>,
    pub missing_materials: Vec<MaterialType>,
    pub processing_cost: f64,
    pub discount: f64,
    pub total_cost: f64,
    pub unit_cost: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl CostEstimate {
    /// Whether the quote still holds at `at`; `valid_until` itself is included
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at <= self.valid_until
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSummary {
    pub name: String,
    pub lead_time: u32,
}

/// Response body of the estimate endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub id: Uuid,
    pub material_costs: BTreeMap<MaterialType, f64>,
    pub missing_materials: Vec<MaterialType>,
    pub processing_costs: f64,
    pub discount: f64,
    pub total_cost: f64,
    pub unit_cost: f64,
    pub valid_until: DateTime<Utc>,
    pub supplier: SupplierSummary,
}

impl From<CostEstimate> for EstimateResponse {
    fn from(estimate: CostEstimate) -> Self {
        Self {
            id: estimate.id,
            material_costs: estimate.material_costs,
            missing_materials: estimate.missing_materials,
            processing_costs: estimate.processing_cost,
            discount: estimate.discount,
            total_cost: estimate.total_cost,
            unit_cost: estimate.unit_cost,
            valid_until: estimate.valid_until,
            supplier: SupplierSummary {
                name: estimate.supplier_name,
                lead_time: estimate.lead_time_days,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_panel_area_is_converted_to_square_metres() {
        let panel = Panel {
            name: "1000x500".to_string(),
            width_mm: 1000.0,
            height_mm: 500.0,
            active: true,
        };
        assert_eq!(panel.area_m2(), 0.5);
    }

    #[test]
    fn test_material_type_parsing() {
        assert_eq!("aerogel".parse::<MaterialType>().unwrap(), MaterialType::Aerogel);
        assert!("kevlar".parse::<MaterialType>().is_err());
        assert_eq!("premium".parse::<MaterialGrade>().unwrap(), MaterialGrade::Premium);
    }

    #[test]
    fn test_parsing_matches_json_names() {
        // FromStr and serde accept exactly the same spellings
        assert!("Premium".parse::<MaterialGrade>().is_err());
        assert!(serde_json::from_str::<MaterialGrade>(r#""Premium""#).is_err());
        assert!("Aerogel".parse::<MaterialType>().is_err());
        assert!(serde_json::from_str::<MaterialType>(r#""Aerogel""#).is_err());

        for grade in [MaterialGrade::Standard, MaterialGrade::Premium] {
            let json: MaterialGrade = serde_json::from_value(serde_json::json!(grade.as_str())).unwrap();
            assert_eq!(grade.as_str().parse::<MaterialGrade>().unwrap(), json);
        }
        for material in MaterialType::ALL {
            let json: MaterialType = serde_json::from_value(serde_json::json!(material.as_str())).unwrap();
            assert_eq!(material.as_str().parse::<MaterialType>().unwrap(), json);
        }
    }

    #[test]
    fn test_validity_window_open_state() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let closed = ValidityWindow {
            valid_from: start,
            valid_to: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
        };

        assert!(!closed.is_open());
        assert!(ValidityWindow::open_from(start).is_open());
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request: EstimateRequest = serde_json::from_str(
            r#"{"quantity": 100, "panelSize": "500x500", "materialGrade": "standard", "supplierId": "aspen"}"#,
        )
        .unwrap();
        assert_eq!(request.quantity, 100);
        assert_eq!(request.material_grade, MaterialGrade::Standard);
    }
}
