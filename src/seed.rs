//! Baseline reference data: suppliers, discount tiers, material and process
//! rates, panel sizes and compatibility rules.
//!
//! Seeding replaces all reference data in one transaction. Stored estimates
//! are left alone.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

struct SeedSupplier {
    id: &'static str,
    name: &'static str,
    cost_multiplier: f64,
    lead_time_days: i64,
    min_order_value: f64,
    tiers: &'static [(i64, f64)],
}

/// (material, unit, wastage, minimum order, standard price, standard lead
/// time, premium price, premium lead time)
type SeedMaterial = (&'static str, &'static str, f64, f64, f64, i64, f64, i64);

const SUPPLIERS: &[SeedSupplier] = &[
    SeedSupplier {
        id: "aspen",
        name: "Aspen Aerogels",
        cost_multiplier: 1.2,
        lead_time_days: 14,
        min_order_value: 5000.0,
        tiers: &[(100, 0.05), (500, 0.10), (1000, 0.15)],
    },
    SeedSupplier {
        id: "morgan",
        name: "Morgan Advanced Materials",
        cost_multiplier: 1.35,
        lead_time_days: 21,
        min_order_value: 7500.0,
        tiers: &[(250, 0.08), (750, 0.12), (1500, 0.18)],
    },
];

const MATERIALS: &[SeedMaterial] = &[
    ("polyimide", "m²", 0.15, 10.0, 120.0, 14, 180.0, 21),
    ("aerogel", "kg", 0.20, 5.0, 250.0, 21, 350.0, 28),
    ("titanium", "m²", 0.25, 5.0, 180.0, 21, 250.0, 28),
    ("adhesive", "m²", 0.10, 20.0, 45.0, 7, 65.0, 14),
];

const PANELS: &[(&str, f64, f64)] = &[
    ("500x500", 500.0, 500.0),
    ("1000x500", 1000.0, 500.0),
    ("1000x1000", 1000.0, 1000.0),
];

/// (process, hourly rate, setup cost)
const PROCESSES: &[(&str, f64, f64)] = &[
    ("cutting", 45.0, 150.0),
    ("bonding", 35.0, 100.0),
    ("quality_control", 40.0, 75.0),
];

const COMPATIBILITY: &[(&str, &str, &str)] = &[
    ("polyimide", "aerogel", "Standard bonding process"),
    ("titanium", "polyimide", "Requires surface treatment"),
];

/// Row counts written by [`seed_reference_data`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub suppliers: usize,
    pub discount_tiers: usize,
    pub material_rates: usize,
    pub panels: usize,
    pub processes: usize,
    pub compatibility_rules: usize,
}

pub async fn seed_reference_data(pool: &SqlitePool) -> Result<SeedSummary> {
    let now = Utc::now().timestamp_millis();
    let mut tx = pool.begin().await.context("Failed to start seed transaction")?;

    for table in [
        "material_compatibility",
        "process_rates",
        "panel_sizes",
        "material_rates",
        "bulk_discounts",
        "suppliers",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to clear {}", table))?;
    }

    let mut summary = SeedSummary {
        suppliers: 0,
        discount_tiers: 0,
        material_rates: 0,
        panels: 0,
        processes: 0,
        compatibility_rules: 0,
    };

    for supplier in SUPPLIERS {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, kind, cost_multiplier, lead_time_days, min_order_value, created_at)
            VALUES (?, ?, 'manufacturer', ?, ?, ?, ?)
            "#,
        )
        .bind(supplier.id)
        .bind(supplier.name)
        .bind(supplier.cost_multiplier)
        .bind(supplier.lead_time_days)
        .bind(supplier.min_order_value)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        summary.suppliers += 1;

        for &(min_quantity, discount) in supplier.tiers {
            sqlx::query(
                "INSERT INTO bulk_discounts (supplier_id, min_quantity, discount, valid_from) VALUES (?, ?, ?, ?)",
            )
            .bind(supplier.id)
            .bind(min_quantity)
            .bind(discount)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            summary.discount_tiers += 1;
        }

        for &(material, unit, wastage, minimum, std_price, std_lead, prem_price, prem_lead) in MATERIALS {
            for (grade, price, lead) in [("standard", std_price, std_lead), ("premium", prem_price, prem_lead)] {
                sqlx::query(
                    r#"
                    INSERT INTO material_rates (
                        supplier_id, material_type, grade, base_price, unit,
                        wastage_rate, minimum_order, lead_time_days, valid_from
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(supplier.id)
                .bind(material)
                .bind(grade)
                .bind(price)
                .bind(unit)
                .bind(wastage)
                .bind(minimum)
                .bind(lead)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                summary.material_rates += 1;
            }
        }
    }

    for &(name, width, height) in PANELS {
        sqlx::query("INSERT INTO panel_sizes (name, width_mm, height_mm, active, created_at) VALUES (?, ?, ?, 1, ?)")
            .bind(name)
            .bind(width)
            .bind(height)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        summary.panels += 1;
    }

    for &(process, base_rate, setup_cost) in PROCESSES {
        sqlx::query(
            "INSERT INTO process_rates (process_type, base_rate, setup_cost, currency, valid_from) VALUES (?, ?, ?, 'USD', ?)",
        )
        .bind(process)
        .bind(base_rate)
        .bind(setup_cost)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        summary.processes += 1;
    }

    for &(primary, secondary, notes) in COMPATIBILITY {
        sqlx::query(
            r#"
            INSERT INTO material_compatibility (primary_material, secondary_material, compatible, notes, valid_from)
            VALUES (?, ?, 1, ?, ?)
            "#,
        )
        .bind(primary)
        .bind(secondary)
        .bind(notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        summary.compatibility_rules += 1;
    }

    tx.commit().await.context("Failed to commit seed data")?;

    info!(
        suppliers = summary.suppliers,
        material_rates = summary.material_rates,
        panels = summary.panels,
        processes = summary.processes,
        "Seeded reference data"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_counts() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        let summary = seed_reference_data(&pool).await.unwrap();

        assert_eq!(summary.suppliers, 2);
        assert_eq!(summary.discount_tiers, 6);
        assert_eq!(summary.material_rates, 16);
        assert_eq!(summary.panels, 3);
        assert_eq!(summary.processes, 3);
        assert_eq!(summary.compatibility_rules, 2);
    }

    #[tokio::test]
    async fn test_reseeding_replaces_reference_data() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        seed_reference_data(&pool).await.unwrap();
        seed_reference_data(&pool).await.unwrap();

        let rates: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM material_rates")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rates, 16);
    }
}
