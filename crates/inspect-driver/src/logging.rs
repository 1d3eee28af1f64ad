//! Logging setup

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "INSPECT_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber once per process
///
/// `INSPECT_LOG` takes precedence over `default_level`. If another
/// subscriber is already installed it is left in place.
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}
