//! Configuration management.
//!
//! Values come from an optional TOML file overlaid with `INNSIGHT__*`
//! environment variables, e.g. `INNSIGHT__AUTH__JWT_SECRET` or
//! `INNSIGHT__SERVER__PORT`.

use serde::Deserialize;

use crate::error::InnsightError;
use crate::middleware::{AuthConfig, GateConfig, RequestGate};
use crate::telemetry::{LoggingConfig, MetricsConfig, TelemetryConfig};

const ENV_PREFIX: &str = "INNSIGHT";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Token verification
    #[serde(default)]
    pub auth: AuthConfig,

    /// Request gate and route policy
    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a specific file path. Environment variables still win.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: self.logging.clone(),
            metrics: self.metrics.clone(),
            ..TelemetryConfig::default()
        }
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), InnsightError> {
        if self.auth.jwt_secret.as_deref().map_or(true, str::is_empty) {
            return Err(InnsightError::missing_configuration("auth.jwt_secret"));
        }
        if !self.gate.login_path.starts_with('/') || !self.gate.denied_path.starts_with('/') {
            return Err(InnsightError::configuration(
                "gate.login_path and gate.denied_path must be absolute paths",
            ));
        }
        if self.gate.routes.entries().iter().any(|r| r.roles.is_empty()) {
            return Err(InnsightError::configuration(
                "gate.routes entries must list at least one role",
            ));
        }
        if !RequestGate::new(self.gate.clone()).is_public(&self.gate.login_path) {
            return Err(InnsightError::configuration(
                "gate.login_path must not require a role",
            ));
        }
        Ok(())
    }
}
