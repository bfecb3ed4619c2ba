use anyhow::Result;
use colored::Colorize;
use panel_cost_estimator::config::Config;

/// Execute the config show command
///
/// Prints the effective configuration after file and environment layering
pub fn show(cfg: &Config) -> Result<()> {
    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(cfg)?;
    println!("{}", toml_string);

    Ok(())
}
