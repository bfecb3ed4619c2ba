use anyhow::Result;
use colored::Colorize;
use panel_cost_estimator::{config::Config, db};

/// Apply pending migrations to the configured database
pub async fn execute(cfg: &Config) -> Result<()> {
    println!("{} {}", "Migrating".yellow(), cfg.database.url);

    let pool = db::connect(&cfg.database.url, cfg.database.max_connections).await?;
    db::run_migrations(&pool).await?;
    pool.close().await;

    println!("{}", "✓ Database is up to date".green());
    Ok(())
}
