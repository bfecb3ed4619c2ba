use anyhow::Result;
use colored::Colorize;
use panel_cost_estimator::pricing::production::{self, QcComplexity};
use panel_cost_estimator::pricing::report::round_currency;

use crate::cli::AnalyzeCommands;

/// Run one of the planning calculators
pub fn execute(action: AnalyzeCommands) -> Result<()> {
    match action {
        AnalyzeCommands::ProcessingTime { area, quantity } => {
            let hours = production::processing_time(area, quantity);
            println!("{}: {:.2} h", "Processing Time".cyan(), hours);
        }
        AnalyzeCommands::QcCost { total, complexity } => {
            let complexity: QcComplexity = complexity.parse()?;
            let cost = production::quality_control_cost(total, complexity);
            println!(
                "{}: ${:.2} ({:.0}% of total)",
                "Quality Control".cyan(),
                round_currency(cost),
                complexity.rate() * 100.0
            );
        }
        AnalyzeCommands::Roi {
            total,
            lifespan,
            savings,
            maintenance,
        } => {
            let roi = production::roi(total, lifespan, savings, maintenance)?;
            let rendered = format!("{:.2}%", roi);
            let rendered = if roi >= 0.0 { rendered.green() } else { rendered.red() };
            println!("{}: {}", "ROI".cyan(), rendered);
        }
    }

    Ok(())
}
