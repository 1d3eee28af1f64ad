//! Error types for the inspection engine

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum Error {
    /// A plugin rejected its configuration or failed to initialize
    #[error("plugin {plugin} failed to initialize: {message}")]
    Plugin {
        /// Name of the plugin
        plugin: String,
        /// Message reported by the plugin
        message: String,
    },

    /// A plugin with the same name is already registered
    #[error("plugin already registered: {0}")]
    DuplicatePlugin(String),

    /// The descriptor declares no capabilities at all
    #[error("plugin {0} declares no capabilities")]
    NoCapabilities(String),

    /// No registered plugin has the requested name
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    /// The plugin exists but cannot generate events
    #[error("plugin {0} does not provide an event source")]
    NotASource(String),

    /// The event source refused to open
    #[error("failed to open event source {source_name}: {reason}")]
    Open {
        /// Capture file path or plugin name
        source_name: String,
        /// The reason reported by the source
        reason: String,
    },

    /// The capture file is not in the expected format
    #[error("malformed capture file at line {line}: {reason}")]
    Malformed {
        /// 1-based line number of the offending record
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The engine is already capturing from a source
    #[error("capture already started")]
    AlreadyCapturing,

    /// The field name does not follow the field syntax
    #[error("invalid field name {name:?}: {reason}")]
    InvalidFieldName {
        /// The offending field name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an open error
    pub fn open(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Open {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed capture error
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
