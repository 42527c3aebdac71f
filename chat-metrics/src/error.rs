//! Errors raised while setting up the metrics pipeline itself.

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics system already initialized")]
    AlreadyInitialized,

    #[error("OpenTelemetry error: {0}")]
    OpenTelemetry(String),
}
