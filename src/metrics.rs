use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and describe the estimator metrics.
/// Fails if a global recorder is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!("estimates_total", "Total number of cost estimates created");
    describe_counter!("estimate_errors_total", "Total number of failed estimate requests");
    describe_histogram!(
        "estimate_duration_seconds",
        "Time to resolve, compute and persist an estimate"
    );
    describe_histogram!("estimate_total_cost", "Total cost of created estimates");
    describe_gauge!("cost_estimator_info", "Service version and build information");

    gauge!("cost_estimator_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record a successfully created estimate
pub fn record_estimate(grade: &str, supplier: &str, total_cost: f64, duration: Duration) {
    counter!(
        "estimates_total",
        "grade" => grade.to_string(),
        "supplier" => supplier.to_string(),
    )
    .increment(1);

    histogram!("estimate_duration_seconds").record(duration.as_secs_f64());
    histogram!("estimate_total_cost", "supplier" => supplier.to_string()).record(total_cost);
}

/// Record a failed estimate request
pub fn record_estimate_error(error_type: &str) {
    counter!("estimate_errors_total", "error_type" => error_type.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metrics() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            init_metric_descriptions();
            record_estimate("standard", "aspen", 10630.5, Duration::from_millis(12));
            record_estimate_error("invalid_supplier");
        });

        let rendered = handle.render();
        assert!(rendered.contains("estimates_total"));
        assert!(rendered.contains("supplier=\"aspen\""));
        assert!(rendered.contains("estimate_errors_total"));
        assert!(rendered.contains("error_type=\"invalid_supplier\""));
    }
}
