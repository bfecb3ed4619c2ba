use anyhow::Result;
use colored::Colorize;
use panel_cost_estimator::{config::Config, seed};

/// Replace reference data with the baseline data set
pub async fn execute(cfg: &Config) -> Result<()> {
    let state = super::open_state(cfg).await?;
    let summary = seed::seed_reference_data(state.store.pool()).await?;

    println!("{}", "✓ Reference data seeded".green());
    println!("  {}: {}", "Suppliers".cyan(), summary.suppliers);
    println!("  {}: {}", "Discount Tiers".cyan(), summary.discount_tiers);
    println!("  {}: {}", "Material Rates".cyan(), summary.material_rates);
    println!("  {}: {}", "Panel Sizes".cyan(), summary.panels);
    println!("  {}: {}", "Processes".cyan(), summary.processes);
    println!("  {}: {}", "Compatibility Rules".cyan(), summary.compatibility_rules);

    state.store.pool().close().await;
    Ok(())
}
