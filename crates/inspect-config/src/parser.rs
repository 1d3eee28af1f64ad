//! Configuration parser with environment variable substitution

use crate::resolver::{ResolutionContext, resolve_string};
use crate::{DriverConfig, Result};
use std::path::Path;
use tracing::debug;

/// Parse a YAML configuration file
pub fn parse_file(path: impl AsRef<Path>) -> Result<DriverConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    debug!("Loading driver configuration from {}", path.display());
    parse_str(&content)
}

/// Parse YAML configuration from a string, resolving against the environment
pub fn parse_str(content: &str) -> Result<DriverConfig> {
    parse_str_with(content, &ResolutionContext::new())
}

/// Parse YAML configuration from a string with an explicit context
pub fn parse_str_with(content: &str, context: &ResolutionContext) -> Result<DriverConfig> {
    let resolved = resolve_string(content, context)?;
    let config: DriverConfig = if resolved.trim().is_empty() {
        DriverConfig::default()
    } else {
        serde_yaml::from_str(&resolved)?
    };
    config.validate()?;
    Ok(config)
}
