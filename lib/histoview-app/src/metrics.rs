//! Metrics.
//!
//! Metrics are exported in the Prometheus exposition format, with the duration histogram buckets applied.

use histoview_buckets::{BucketSources, HistogramBucketCustomizer};
use histoview_error::{generic_error, ErrorContext as _, GenericError};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tracing::debug;

/// Builds a Prometheus recorder whose duration histograms use the buckets resolved from `sources`.
///
/// The recorder is not installed. Use [`initialize_metrics`] for that, or install it locally with
/// `metrics::with_local_recorder`.
///
/// # Errors
///
/// If the duration histogram view cannot be registered with the exporter, an error is returned.
pub fn build_metrics_recorder(sources: &BucketSources) -> Result<PrometheusRecorder, GenericError> {
    let builder = HistogramBucketCustomizer::from_sources(sources)
        .customize(PrometheusBuilder::new())
        .error_context("Failed to register duration histogram view.")?;

    Ok(builder.build_recorder())
}

/// Initializes the metrics subsystem for `metrics`.
///
/// Builds the recorder as [`build_metrics_recorder`] does and installs it as the global recorder. The returned handle
/// renders the current metrics in the Prometheus exposition format.
///
/// # Errors
///
/// If the recorder cannot be built, or if the metrics subsystem was already initialized, an error will be returned.
pub fn initialize_metrics(sources: &BucketSources) -> Result<PrometheusHandle, GenericError> {
    let recorder = build_metrics_recorder(sources)?;
    let handle = recorder.handle();

    metrics::set_global_recorder(recorder).map_err(|_| generic_error!("Metrics subsystem already initialized."))?;
    debug!("Installed global metrics recorder.");

    Ok(handle)
}
