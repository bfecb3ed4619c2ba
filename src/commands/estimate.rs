use anyhow::Result;
use colored::Colorize;
use panel_cost_estimator::{config::Config, pricing::report, pricing::EstimateRequest};

use crate::cli::EstimateArgs;

/// Create and persist an estimate, then print its report
pub async fn execute(cfg: &Config, args: EstimateArgs) -> Result<()> {
    let state = super::open_state(cfg).await?;

    let request = EstimateRequest {
        quantity: args.quantity,
        panel_size: args.panel_size,
        material_grade: args.grade,
        supplier_id: args.supplier,
    };

    let estimate = match state.service.create_estimate(&request).await {
        Ok(estimate) => estimate,
        Err(e) => {
            println!("{} {}", "✗ Estimate failed:".red(), e);
            state.store.pool().close().await;
            return Err(e.into());
        }
    };

    println!("{} {}", "✓ Created estimate".green(), estimate.id.to_string().bold());
    println!();
    print!("{}", report::render_report(&estimate, chrono::Utc::now()));

    state.store.pool().close().await;
    Ok(())
}
