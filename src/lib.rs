pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pricing;
pub mod seed;
pub mod server;
pub mod signals;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over the configured level. Call once per process.
pub fn init_tracing(server: &config::ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if server.log_format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
