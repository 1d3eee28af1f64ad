//! # Inspect Configuration
//!
//! YAML configuration for the inspect-harness driver.
//!
//! ```yaml
//! log_level: debug
//! engine:
//!   platform_metadata_default: true
//!   hostname: ${INSPECT_HOSTNAME:-ci-runner}
//! metrics:
//!   plugins: true
//!   engine: true
//! ```
//!
//! Every section is optional. `${VAR}` and `${VAR:-default}` references are
//! resolved against the environment before the YAML is parsed.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub mod parser;
pub mod resolver;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Log levels accepted in `log_level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Root driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Default log level, overridden by `INSPECT_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Engine options
    #[serde(default)]
    pub engine: EngineSettings,

    /// Metric groups included in snapshots
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            engine: EngineSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Engine options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    /// Attach platform metadata to plugin events when the caller does not say
    #[serde(default)]
    pub platform_metadata_default: bool,

    /// Host name reported in platform metadata instead of the detected one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Metric groups
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSettings {
    /// Plugin metrics
    #[serde(default = "default_true")]
    pub plugins: bool,

    /// Engine counters
    #[serde(default)]
    pub engine: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            plugins: true,
            engine: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl DriverConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        parser::parse_file(path)
    }

    /// Parse and validate a configuration string
    pub fn from_str(content: &str) -> Result<Self> {
        parser::parse_str(content)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Unknown log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if let Some(hostname) = &self.engine.hostname {
            if hostname.trim().is_empty() || hostname.contains(char::is_whitespace) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid hostname override '{}'",
                    hostname
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.engine.platform_metadata_default);
        assert!(config.metrics.plugins);
        assert!(!config.metrics.engine);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_log_level() {
        let config = DriverConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let config = DriverConfig {
            log_level: "DEBUG".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_hostname() {
        let mut config = DriverConfig::default();
        config.engine.hostname = Some("two words".to_string());
        assert!(config.validate().is_err());

        config.engine.hostname = Some("node-7".to_string());
        assert!(config.validate().is_ok());
    }
}
