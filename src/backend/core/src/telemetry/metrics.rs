//! Prometheus metrics for authorization decisions.
//!
//! Counters recorded across the crate:
//!
//! - `gate_decisions_total{outcome}`: one per gated page request
//! - `permission_checks_total{permission, allowed}`
//! - `innsight_errors_total{code, category}`: API errors returned

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Deserialize;
use std::collections::HashMap;

/// Metrics configuration (`[metrics]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Global labels to add to all metrics
    #[serde(default)]
    pub global_labels: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            global_labels: HashMap::new(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

/// Handle to the installed recorder; renders the `/metrics` body.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    prometheus_handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("prometheus_handle", &self.prometheus_handle.is_some())
            .finish()
    }
}

impl MetricsRegistry {
    /// A registry with no recorder; renders an empty body.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.prometheus_handle.is_some()
    }

    /// Render all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.prometheus_handle
            .as_ref()
            .map(|h| h.render())
            .unwrap_or_default()
    }
}

/// Install the global Prometheus recorder.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig, service_name: &str) -> anyhow::Result<MetricsRegistry> {
    if !config.enabled {
        return Ok(MetricsRegistry::disabled());
    }

    let mut builder = PrometheusBuilder::new().add_global_label("service", service_name);
    for (key, value) in &config.global_labels {
        builder = builder.add_global_label(key, value);
    }
    let handle = builder.install_recorder()?;

    register_metric_descriptions();

    Ok(MetricsRegistry {
        prometheus_handle: Some(handle),
    })
}

fn register_metric_descriptions() {
    describe_counter!(
        "gate_decisions_total",
        "Request gate outcomes by outcome (allowed, public, redirect_login, redirect_denied)"
    );
    describe_counter!(
        "permission_checks_total",
        "Permission table lookups by permission and result"
    );
    describe_counter!("innsight_errors_total", "API errors returned by code");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_registry_renders_empty() {
        let registry = init_metrics(
            &MetricsConfig {
                enabled: false,
                ..Default::default()
            },
            "test",
        )
        .unwrap();
        assert!(!registry.is_enabled());
        assert_eq!(registry.render(), "");
    }
}
