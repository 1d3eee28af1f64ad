//! Error types for the driver

use crate::driver::CaptureState;
use thiserror::Error;

/// Driver error type
#[derive(Error, Debug)]
pub enum Error {
    /// The plugin could not be registered; carries the plugin's own message
    #[error("Plugin initialization failed: {0}")]
    Initialization(String),

    /// The event source could not be opened
    #[error("Failed to open event source: {0}")]
    Open(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid capture state transition
    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        /// Current state
        from: CaptureState,
        /// Attempted state
        to: CaptureState,
    },

    /// The field name is malformed or no extractor knows it
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// The event handle does not refer to any event
    #[error("Null event handle")]
    NullEvent,

    /// The event handle refers to an event that is no longer current
    #[error("Stale event handle")]
    StaleEvent,

    /// The field has no value for this event
    #[error("No value for field {0}")]
    NullValue(String),

    /// The extractor failed on this event
    #[error("Failed to extract {field}: {message}")]
    Extraction {
        /// Field name
        field: String,
        /// Failure reported by the extractor
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] inspect_config::ConfigError),

    /// Engine error
    #[error("Engine error: {0}")]
    Engine(#[from] inspect_engine::Error),
}

impl Error {
    /// Classify an engine error raised while registering a plugin
    pub(crate) fn from_registration(err: inspect_engine::Error) -> Self {
        match err {
            inspect_engine::Error::Plugin { message, .. } => Error::Initialization(message),
            other @ (inspect_engine::Error::DuplicatePlugin(_)
            | inspect_engine::Error::NoCapabilities(_)) => {
                Error::Initialization(other.to_string())
            }
            other => Error::Engine(other),
        }
    }

    /// Classify an engine error raised while opening a source
    pub(crate) fn from_open(err: inspect_engine::Error) -> Self {
        match err {
            inspect_engine::Error::Io(e) => Error::Io(e),
            other @ (inspect_engine::Error::Open { .. }
            | inspect_engine::Error::Malformed { .. }
            | inspect_engine::Error::PluginNotFound(_)
            | inspect_engine::Error::NotASource(_)
            | inspect_engine::Error::Json(_)) => Error::Open(other.to_string()),
            other => Error::Engine(other),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
