use anyhow::Result;
use clap::Parser;
use std::path::Path;

mod cli;
mod commands;

use panel_cost_estimator::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(load(&args.config)?).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&load(&args.config)?)?,
        },
        cli::Commands::Migrate => {
            commands::migrate::execute(&load(&args.config)?).await?;
        }
        cli::Commands::Seed => {
            commands::seed::execute(&load(&args.config)?).await?;
        }
        cli::Commands::Estimate(estimate_args) => {
            commands::estimate::execute(&load(&args.config)?, estimate_args).await?;
        }
        cli::Commands::Report { id } => {
            commands::report::execute(&load(&args.config)?, &id).await?;
        }
        cli::Commands::Analyze { action } => {
            commands::analyze::execute(action)?;
        }
        cli::Commands::Version => {
            println!("Panel Cost Estimator v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Load configuration and initialize logging from it
fn load(path: &Path) -> Result<config::Config> {
    let cfg = config::load_config(path)?;
    init_tracing(&cfg.server);
    Ok(cfg)
}
