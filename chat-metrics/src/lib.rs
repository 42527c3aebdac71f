#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! OpenTelemetry metrics for the chat delivery service, pushed via OTLP/HTTP
//! to a collector that exposes them for Prometheus to scrape.

mod config;
mod error;
mod exporter;
mod pipeline;

pub use config::MetricsConfig;
pub use error::MetricsError;
use once_cell::sync::OnceCell;
pub use pipeline::PipelineMetrics;

static METRICS_INSTANCE: OnceCell<PipelineMetrics> = OnceCell::new();

/// Brings up the OTLP exporter and registers the pipeline's instruments.
/// A no-op when `config.enabled` is `false`.
///
/// # Errors
/// Returns an error if the exporter cannot be built or if called twice.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        tracing::info!("metrics collection disabled");
        return Ok(());
    }

    let provider = exporter::init_otlp_exporter(&config.endpoint)?;
    opentelemetry::global::set_meter_provider(provider);

    let metrics = PipelineMetrics::new()?;
    METRICS_INSTANCE
        .set(metrics)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    tracing::info!("metrics collection initialized");
    Ok(())
}

/// # Panics
/// Panics if called before [`init_metrics`], or when metrics are disabled.
#[must_use]
pub fn metrics() -> &'static PipelineMetrics {
    METRICS_INSTANCE.get().expect("metrics not initialized")
}

#[must_use]
pub fn is_enabled() -> bool {
    METRICS_INSTANCE.get().is_some()
}
