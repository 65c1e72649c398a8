use std::path::Path;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::errors::{Result, ScoringError};

/// Install the Prometheus recorder and register all run metrics.
/// The returned handle renders the text exposition format.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    describe_counter!("records_loaded_total", "Transaction records loaded, by kind");
    describe_counter!("records_dropped_total", "Records dropped for an invalid amount");
    describe_gauge!("wallets_scored", "Wallets with a feature row in the last run");
    describe_histogram!("pipeline_duration_seconds", "Wall time of load through selection");

    // Pre-register so they appear even when nothing was dropped.
    counter!("records_dropped_total").absolute(0);
    gauge!("wallets_scored").set(0.0);

    Ok(handle)
}

/// Write the current metric snapshot to `path`.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    std::fs::write(path, handle.render()).map_err(|source| ScoringError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Metrics snapshot written");
    Ok(())
}
