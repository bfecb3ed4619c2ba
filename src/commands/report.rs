use anyhow::{Context, Result};
use panel_cost_estimator::config::Config;
use uuid::Uuid;

/// Print the report of a stored estimate
pub async fn execute(cfg: &Config, id: &str) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("Invalid estimate id '{}'", id))?;
    let state = super::open_state(cfg).await?;

    let report = state.service.report(id).await;
    state.store.pool().close().await;

    print!("{}", report?);
    Ok(())
}
