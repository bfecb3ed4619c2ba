use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub estimates: EstimatesConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. "sqlite:./data/estimates.db"
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data/estimates.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Longest accepted quote validity
pub const MAX_VALIDITY_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EstimatesConfig {
    /// How long a quote stays valid after creation
    pub validity_days: i64,
}

impl Default for EstimatesConfig {
    fn default() -> Self {
        Self { validity_days: 30 }
    }
}

impl EstimatesConfig {
    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::days(self.validity_days)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}

/// Load configuration from a TOML file (optional) layered with
/// `COST_ESTIMATOR__SECTION__KEY` environment variables.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("COST_ESTIMATOR").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.host.parse::<std::net::IpAddr>().is_err() {
        anyhow::bail!("Invalid server host '{}': expected an IP address", cfg.server.host);
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid log format '{}': expected 'text' or 'json'", other),
    }

    if !cfg.database.url.starts_with("sqlite:") {
        anyhow::bail!("Database URL must start with 'sqlite:'");
    }

    if cfg.database.max_connections == 0 {
        anyhow::bail!("database.max_connections must be at least 1");
    }

    if !(1..=MAX_VALIDITY_DAYS).contains(&cfg.estimates.validity_days) {
        anyhow::bail!(
            "estimates.validity_days must be between 1 and {}, got {}",
            MAX_VALIDITY_DAYS,
            cfg.estimates.validity_days
        );
    }

    if cfg.metrics.enabled && !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!("Metrics endpoint '{}' must start with '/'", cfg.metrics.endpoint);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.estimates.validity_days, 30);
        assert_eq!(cfg.estimates.validity(), chrono::Duration::days(30));
    }

    #[test]
    fn test_validate_config_rejects_bad_log_format() {
        let mut cfg = Config::default();
        cfg.server.log_format = "xml".to_string();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log format"));
    }

    #[test]
    fn test_validate_config_rejects_non_sqlite_url() {
        let mut cfg = Config::default();
        cfg.database.url = "postgres://localhost/estimates".to_string();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("sqlite:"));
    }

    #[test]
    fn test_validate_config_rejects_zero_validity() {
        let mut cfg = Config::default();
        cfg.estimates.validity_days = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_bounds_validity() {
        let mut cfg = Config::default();
        cfg.estimates.validity_days = MAX_VALIDITY_DAYS;
        assert!(validate_config(&cfg).is_ok());

        cfg.estimates.validity_days = MAX_VALIDITY_DAYS + 1;
        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("validity_days"));
    }

    #[test]
    fn test_load_config_rejects_huge_validity() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[estimates]\nvalidity_days = 100000000").unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9191
log_format = "json"

[estimates]
validity_days = 14
"#
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.server.port, 9191);
        assert_eq!(cfg.server.log_format, "json");
        assert_eq!(cfg.estimates.validity_days, 14);
        // Untouched sections keep their defaults
        assert!(cfg.metrics.enabled);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let cfg = load_config(Path::new("/nonexistent/cost-estimator.toml")).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.max_connections, 5);
    }
}
