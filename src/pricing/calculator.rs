use crate::error::AppError;
use crate::pricing::models::{
    CostComputation, MaterialCostBreakdown, MaterialRate, MaterialType, ProcessRate, Supplier,
};
use std::collections::BTreeMap;

/// Quantity of a material consumed per m² of panel, in the material's
/// pricing unit. Aerogel is priced per kg at 0.5 kg/m²; the sheet materials
/// are priced per m² of coverage.
pub fn quantity_per_m2(material: MaterialType) -> f64 {
    match material {
        MaterialType::Polyimide => 1.0,
        MaterialType::Aerogel => 0.5,
        MaterialType::Titanium => 1.0,
        MaterialType::Adhesive => 1.0,
    }
}

/// Cost of one material for the whole order
pub fn material_cost(rate: &MaterialRate, area_m2: f64, quantity: u32) -> f64 {
    let base_amount = area_m2 * quantity_per_m2(rate.material_type);
    let wastage = 1.0 + rate.wastage_rate;
    rate.base_price * base_amount * wastage * f64::from(quantity)
}

/// Per-material costs. `rates` must be ordered newest first; only the first
/// rate seen for each material is used.
pub fn material_costs(rates: &[MaterialRate], area_m2: f64, quantity: u32) -> MaterialCostBreakdown {
    let mut costs = BTreeMap::new();
    for rate in rates {
        costs
            .entry(rate.material_type)
            .or_insert_with(|| material_cost(rate, area_m2, quantity));
    }

    let missing = MaterialType::ALL
        .into_iter()
        .filter(|m| !costs.contains_key(m))
        .collect();

    MaterialCostBreakdown { costs, missing }
}

/// Setup plus run cost of every process, scaled by the supplier multiplier
pub fn processing_cost(
    processes: &[ProcessRate],
    area_m2: f64,
    quantity: u32,
    supplier_multiplier: f64,
) -> f64 {
    let total: f64 = processes
        .iter()
        .map(|p| p.setup_cost + p.base_rate * area_m2 * f64::from(quantity))
        .sum();

    total * supplier_multiplier
}

/// Full cost computation for one order.
///
/// Nothing is rounded here; presentation code rounds to currency precision.
pub fn compute(
    area_m2: f64,
    quantity: u32,
    supplier: &Supplier,
    rates: &[MaterialRate],
    processes: &[ProcessRate],
) -> Result<CostComputation, AppError> {
    if quantity == 0 {
        return Err(AppError::InvalidRequest("quantity must be at least 1".to_string()));
    }
    check_inputs(area_m2, supplier, rates, processes)?;

    let materials = material_costs(rates, area_m2, quantity);
    let processing_cost = processing_cost(processes, area_m2, quantity, supplier.cost_multiplier);
    let discount = supplier.discount_tiers.discount_for(quantity);

    let subtotal = materials.total() + processing_cost;
    let total_cost = subtotal * (1.0 - discount);
    let unit_cost = total_cost / f64::from(quantity);

    Ok(CostComputation {
        materials,
        processing_cost,
        discount,
        subtotal,
        total_cost,
        unit_cost,
    })
}

/// Reject stored reference data that would produce negative or non-finite money
fn check_inputs(
    area_m2: f64,
    supplier: &Supplier,
    rates: &[MaterialRate],
    processes: &[ProcessRate],
) -> Result<(), AppError> {
    fn non_negative(value: f64, what: &str) -> Result<(), AppError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(AppError::DataIntegrity(format!("{} must be a non-negative number, got {}", what, value)))
        }
    }

    non_negative(area_m2, "panel area")?;
    non_negative(supplier.cost_multiplier, "supplier cost multiplier")?;

    for tier in supplier.discount_tiers.tiers() {
        if !(0.0..=1.0).contains(&tier.discount) {
            return Err(AppError::DataIntegrity(format!(
                "discount tier {} has fraction {} outside [0, 1]",
                tier.min_quantity, tier.discount
            )));
        }
    }

    for rate in rates {
        non_negative(rate.base_price, "material base price")?;
        non_negative(rate.wastage_rate, "material wastage rate")?;
    }

    for process in processes {
        non_negative(process.base_rate, "process base rate")?;
        non_negative(process.setup_cost, "process setup cost")?;
    }

    Ok(())
}
