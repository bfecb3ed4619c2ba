use anyhow::Result;
use colored::Colorize;
use panel_cost_estimator::{config::Config, server};
use tracing::info;

/// Execute the start command: serve until SIGTERM/SIGINT
pub async fn execute(cfg: Config) -> Result<()> {
    println!(
        "{} {}:{}",
        "Starting cost estimator on".green(),
        cfg.server.host,
        cfg.server.port
    );
    info!("Starting cost estimator in foreground mode");

    server::start_server(cfg).await?;

    Ok(())
}
