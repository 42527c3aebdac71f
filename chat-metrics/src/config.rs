//! Metrics configuration: the OTLP push target and the dial to turn the
//! whole system off.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// When disabled, [`crate::init_metrics`] is a no-op and every recorder
    /// call elsewhere in the pipeline is skipped.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// OTLP/HTTP endpoint metrics are pushed to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Optional bearer token sent with every export.
    #[serde(default)]
    pub api_key: Option<String>,
}

const fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:4318/v1/metrics".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_enabled_with_the_local_collector_endpoint() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.endpoint, "http://localhost:4318/v1/metrics");
        assert!(config.api_key.is_none());
    }
}
