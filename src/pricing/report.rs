use crate::pricing::models::CostEstimate;
use chrono::{DateTime, Utc};
use std::fmt;

const TERMS: &[&str] = &[
    "Lead time subject to material availability",
    "Minimum order quantities apply",
    "Pricing includes standard packaging",
    "Shipping costs not included",
];

/// Round to currency precision
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Plain-text quote for a stored estimate as seen at `at`. Amounts are shown
/// with two decimals.
pub fn render_report(estimate: &CostEstimate, at: DateTime<Utc>) -> String {
    Report { estimate, at }.to_string()
}

struct Report<'a> {
    estimate: &'a CostEstimate,
    at: DateTime<Utc>,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let estimate = self.estimate;
        let validity_days = (estimate.valid_until - estimate.created_at).num_days();
        let state = if estimate.is_valid_at(self.at) { "valid" } else { "expired" };

        writeln!(f, "Cost Estimate Report")?;
        writeln!(f, "====================")?;
        writeln!(f, "Estimate: {}", estimate.id)?;
        writeln!(f, "Status: {} ({})", estimate.status, state)?;
        writeln!(f, "Date: {}", estimate.created_at.format("%Y-%m-%d"))?;
        writeln!(f, "Valid Until: {}", estimate.valid_until.format("%Y-%m-%d"))?;
        writeln!(
            f,
            "Order: {} x {} ({}), supplier {}",
            estimate.quantity, estimate.panel_size, estimate.material_grade, estimate.supplier_name
        )?;
        writeln!(f)?;

        writeln!(f, "Material Costs")?;
        writeln!(f, "--------------")?;
        for (material, cost) in &estimate.material_costs {
            writeln!(f, "{}: ${:.2}", material, round_currency(*cost))?;
        }
        for material in &estimate.missing_materials {
            writeln!(f, "{}: no rate available", material)?;
        }
        writeln!(f)?;

        writeln!(f, "Processing Costs")?;
        writeln!(f, "----------------")?;
        writeln!(f, "Total: ${:.2}", round_currency(estimate.processing_cost))?;
        writeln!(f)?;

        writeln!(f, "Summary")?;
        writeln!(f, "-------")?;
        writeln!(f, "Discount: {:.2}%", estimate.discount * 100.0)?;
        writeln!(f, "Total Cost: ${:.2}", round_currency(estimate.total_cost))?;
        writeln!(f, "Unit Cost: ${:.2}", round_currency(estimate.unit_cost))?;
        writeln!(f, "Lead Time: {} days", estimate.lead_time_days)?;
        writeln!(f)?;

        writeln!(f, "Terms and Conditions")?;
        writeln!(f, "--------------------")?;
        writeln!(f, "- Prices valid for {} days", validity_days)?;
        for term in TERMS {
            writeln!(f, "- {}", term)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{MaterialGrade, MaterialType};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn estimate() -> CostEstimate {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut material_costs = BTreeMap::new();
        material_costs.insert(MaterialType::Polyimide, 3450.0);
        material_costs.insert(MaterialType::Aerogel, 3749.999);

        CostEstimate {
            id: Uuid::nil(),
            quantity: 100,
            panel_size: "500x500".to_string(),
            material_grade: MaterialGrade::Standard,
            supplier_id: "aspen".to_string(),
            supplier_name: "Aspen Aerogels".to_string(),
            lead_time_days: 14,
            material_costs,
            missing_materials: vec![MaterialType::Titanium],
            processing_cost: 3990.0,
            discount: 0.05,
            total_cost: 10630.49999,
            unit_cost: 106.3049999,
            status: "draft".to_string(),
            created_at,
            valid_until: created_at + Duration::days(30),
        }
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(106.304999), 106.3);
        assert_eq!(round_currency(0.125), 0.13);
    }

    #[test]
    fn test_report_contents() {
        let estimate = estimate();
        let report = render_report(&estimate, estimate.created_at);

        assert!(report.contains("Date: 2024-03-01"));
        assert!(report.contains("Valid Until: 2024-03-31"));
        assert!(report.contains("aerogel: $3750.00"));
        assert!(report.contains("polyimide: $3450.00"));
        assert!(report.contains("titanium: no rate available"));
        assert!(report.contains("Total: $3990.00"));
        assert!(report.contains("Total Cost: $10630.50"));
        assert!(report.contains("Unit Cost: $106.30"));
        assert!(report.contains("Lead Time: 14 days"));
        assert!(report.contains("- Prices valid for 30 days"));
        assert!(report.contains("Status: draft (valid)"));
    }

    #[test]
    fn test_report_marks_expired_quotes() {
        let estimate = estimate();

        let last_day = render_report(&estimate, estimate.valid_until);
        assert!(last_day.contains("Status: draft (valid)"));

        let after = render_report(&estimate, estimate.valid_until + Duration::seconds(1));
        assert!(after.contains("Status: draft (expired)"));
    }
}
