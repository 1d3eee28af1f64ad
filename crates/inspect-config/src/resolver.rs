//! Environment variable resolver
//!
//! Handles `${VAR}` and `${VAR:-default}` references. Values set on the
//! [`ResolutionContext`] take precedence over the process environment.

use crate::{ConfigError, Result};
use regex::Regex;
use std::collections::HashMap;

const REFERENCE_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}";

/// Context for resolving variables
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Variables that override the process environment
    pub env_vars: HashMap<String, String>,
}

impl ResolutionContext {
    /// Create a context backed by the process environment only
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a variable
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env_vars.insert(key.into(), value.into());
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.env_vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }
}

fn reference_regex() -> Result<Regex> {
    Regex::new(REFERENCE_PATTERN)
        .map_err(|e| ConfigError::ValidationError(format!("invalid reference pattern: {}", e)))
}

/// Resolve every variable reference in `input`
///
/// All missing variables without a default are reported together.
pub fn resolve_string(input: &str, context: &ResolutionContext) -> Result<String> {
    let re = reference_regex()?;
    let mut missing = Vec::new();

    let resolved = re.replace_all(input, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match (context.lookup(name), caps.get(2)) {
            (Some(value), _) => value,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::EnvVarNotFound(missing.join(", ")));
    }

    Ok(resolved.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_env_vars() {
        let mut context = ResolutionContext::new();
        context.set_env("INSPECT_TEST_LEVEL", "debug");
        context.set_env("INSPECT_TEST_HOST", "node-1");

        let result = resolve_string("${INSPECT_TEST_LEVEL}", &context).unwrap();
        assert_eq!(result, "debug");

        let result = resolve_string("host: ${INSPECT_TEST_HOST}.local", &context).unwrap();
        assert_eq!(result, "host: node-1.local");

        let result = resolve_string("${INSPECT_TEST_MISSING:-fallback}", &context).unwrap();
        assert_eq!(result, "fallback");

        let result = resolve_string("${INSPECT_TEST_LEVEL:-ignored}", &context).unwrap();
        assert_eq!(result, "debug");

        let result = resolve_string("${INSPECT_TEST_MISSING:-}", &context).unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_missing_vars_are_reported_together() {
        let context = ResolutionContext::new();
        match resolve_string("${INSPECT_TEST_NOPE_A} ${INSPECT_TEST_NOPE_B}", &context) {
            Err(ConfigError::EnvVarNotFound(names)) => {
                assert_eq!(names, "INSPECT_TEST_NOPE_A, INSPECT_TEST_NOPE_B");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_text_without_references_is_unchanged() {
        let context = ResolutionContext::new();
        let input = "plain $HOME {braces} $";
        assert_eq!(resolve_string(input, &context).unwrap(), input);
    }
}
