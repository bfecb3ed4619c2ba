//! Production planning and analysis helpers: material requirements per
//! panel, adjusted lead times, processing time, quality-control cost and ROI.

use crate::error::AppError;
use crate::pricing::models::MaterialType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Fixed setup time of a production run, in hours
pub const SETUP_HOURS: f64 = 2.0;

/// Production time per panel, in hours
pub const HOURS_PER_UNIT: f64 = 0.5;

/// Material needed for one panel per m² of panel area. Polyimide covers top
/// and bottom layers, aerogel is in kg by density, adhesive includes overlap.
pub fn requirement_factor(material: MaterialType) -> f64 {
    match material {
        MaterialType::Polyimide => 2.0,
        MaterialType::Aerogel => 0.5,
        MaterialType::Titanium => 1.0,
        MaterialType::Adhesive => 1.2,
    }
}

/// Wastage fraction used for planning when no supplier rate is involved
pub fn default_wastage(material: MaterialType) -> f64 {
    match material {
        MaterialType::Polyimide => 0.15,
        MaterialType::Aerogel => 0.20,
        MaterialType::Titanium => 0.25,
        MaterialType::Adhesive => 0.10,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRequest {
    pub quantity: i64,
    pub panel_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEstimate {
    pub setup_time: f64,
    pub production_time: f64,
    pub material_requirements: BTreeMap<MaterialType, f64>,
    pub wastage: BTreeMap<MaterialType, f64>,
}

/// Production plan for `quantity` panels of `area_m2`. Material figures are
/// for a single panel.
pub fn production_estimate(area_m2: f64, quantity: u32) -> ProductionEstimate {
    let material_requirements: BTreeMap<_, _> = MaterialType::ALL
        .into_iter()
        .map(|m| (m, area_m2 * requirement_factor(m)))
        .collect();

    let wastage = material_requirements
        .iter()
        .map(|(m, required)| (*m, required * default_wastage(*m)))
        .collect();

    ProductionEstimate {
        setup_time: SETUP_HOURS,
        production_time: f64::from(quantity) * HOURS_PER_UNIT,
        material_requirements,
        wastage,
    }
}

/// Supplier lead time extended for large orders
pub fn adjusted_lead_time(base_days: u32, quantity: u32) -> u32 {
    match quantity {
        q if q > 1000 => base_days + 14,
        q if q > 500 => base_days + 7,
        _ => base_days,
    }
}

/// Processing hours: setup plus half an hour per unit, scaled by the panel's
/// linear size
pub fn processing_time(area_m2: f64, quantity: u32) -> f64 {
    SETUP_HOURS + HOURS_PER_UNIT * f64::from(quantity) * area_m2.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcComplexity {
    Low,
    Medium,
    High,
}

impl QcComplexity {
    pub fn rate(&self) -> f64 {
        match self {
            Self::Low => 0.05,
            Self::Medium => 0.08,
            Self::High => 0.12,
        }
    }
}

impl FromStr for QcComplexity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(AppError::InvalidRequest(format!("unknown complexity '{}'", other))),
        }
    }
}

pub fn quality_control_cost(total_cost: f64, complexity: QcComplexity) -> f64 {
    total_cost * complexity.rate()
}

/// Return on investment in percent, rounded to two decimals
pub fn roi(total_cost: f64, lifespan_years: f64, annual_savings: f64, annual_maintenance: f64) -> Result<f64, AppError> {
    if total_cost <= 0.0 || !total_cost.is_finite() {
        return Err(AppError::InvalidRequest("total cost must be positive".to_string()));
    }

    let annual_benefit = annual_savings - annual_maintenance;
    let roi = (annual_benefit * lifespan_years - total_cost) / total_cost * 100.0;
    Ok((roi * 100.0).round() / 100.0)
}

/// Parse a "primary-secondary" material pair
pub fn parse_combination(combination: &str) -> Result<(MaterialType, MaterialType), AppError> {
    let (primary, secondary) = combination.split_once('-').ok_or_else(|| {
        AppError::InvalidRequest(format!("expected 'primary-secondary', got '{}'", combination))
    })?;

    Ok((primary.parse()?, secondary.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_estimate_for_quarter_square_metre() {
        let plan = production_estimate(0.25, 100);

        assert_eq!(plan.setup_time, 2.0);
        assert_eq!(plan.production_time, 50.0);
        assert_eq!(plan.material_requirements[&MaterialType::Polyimide], 0.5);
        assert_eq!(plan.material_requirements[&MaterialType::Aerogel], 0.125);
        assert_eq!(plan.material_requirements[&MaterialType::Titanium], 0.25);
        assert!((plan.material_requirements[&MaterialType::Adhesive] - 0.3).abs() < 1e-12);
        assert!((plan.wastage[&MaterialType::Polyimide] - 0.075).abs() < 1e-12);
        assert!((plan.wastage[&MaterialType::Aerogel] - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_adjusted_lead_time_steps() {
        assert_eq!(adjusted_lead_time(14, 500), 14);
        assert_eq!(adjusted_lead_time(14, 501), 21);
        assert_eq!(adjusted_lead_time(14, 1000), 21);
        assert_eq!(adjusted_lead_time(14, 1001), 28);
    }

    #[test]
    fn test_processing_time() {
        assert_eq!(processing_time(1.0, 10), 7.0);
        assert_eq!(processing_time(0.25, 100), 27.0);
    }

    #[test]
    fn test_quality_control_cost() {
        assert_eq!(quality_control_cost(1000.0, QcComplexity::Low), 50.0);
        assert_eq!(quality_control_cost(1000.0, QcComplexity::Medium), 80.0);
        assert_eq!(quality_control_cost(1000.0, QcComplexity::High), 120.0);
        assert!("extreme".parse::<QcComplexity>().is_err());
    }

    #[test]
    fn test_roi_is_rounded() {
        // (3000 - 500) * 10 = 25000 benefit on 10000 cost
        assert_eq!(roi(10000.0, 10.0, 3000.0, 500.0).unwrap(), 150.0);
        assert_eq!(roi(3000.0, 1.0, 1000.0, 0.0).unwrap(), -66.67);
        assert!(roi(0.0, 1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_parse_combination() {
        assert_eq!(
            parse_combination("polyimide-aerogel").unwrap(),
            (MaterialType::Polyimide, MaterialType::Aerogel)
        );
        assert!(parse_combination("polyimide").is_err());
        assert!(parse_combination("polyimide-kevlar").is_err());
    }
}
