//! Telemetry: structured logging and Prometheus metrics.
//!
//! # Example
//!
//! ```rust,no_run
//! use innsight_core::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::default();
//! let metrics = init_telemetry(&config).expect("Failed to initialize telemetry");
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, redact_tokens, LogFormat, LoggingConfig};
pub use metrics::{init_metrics, MetricsConfig, MetricsRegistry};

use serde::Deserialize;

/// Unified telemetry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "innsight-server".to_string()
}

/// Initialize logging, then metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<MetricsRegistry> {
    init_logging(&config.logging)?;
    let registry = init_metrics(&config.metrics, &config.service_name)?;
    tracing::info!(
        service = %config.service_name,
        metrics_enabled = registry.is_enabled(),
        "Telemetry initialized"
    );
    Ok(registry)
}
