//! Event records and stream status codes

use crate::registry::PluginHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event type assigned to events generated by source plugins
pub const PLUGIN_EVENT: u16 = 322;

/// Outcome of advancing an event source by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// An event is available
    Ok,
    /// No event yet, the caller may retry
    Timeout,
    /// The stream is exhausted
    Eof,
    /// The source failed and cannot continue
    Error,
}

impl Status {
    /// Whether no further events will ever be produced
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Eof | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("OK"),
            Status::Timeout => f.write_str("Timeout"),
            Status::Eof => f.write_str("Eof"),
            Status::Error => f.write_str("Error"),
        }
    }
}

/// Host context attached to events when platform metadata is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Host name
    pub hostname: String,
    /// Operating system family
    pub os: String,
    /// CPU architecture
    pub arch: String,
}

impl PlatformInfo {
    /// Detect the current host, optionally overriding the host name
    pub fn detect(hostname: Option<&str>) -> Self {
        let hostname = hostname
            .map(str::to_string)
            .or_else(|| std::env::var("HOSTNAME").ok())
            .or_else(|| {
                std::fs::read_to_string("/proc/sys/kernel/hostname")
                    .ok()
                    .map(|h| h.trim().to_string())
            })
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());

        Self {
            hostname,
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// An event currently held by the engine
///
/// The raw textual representation of the event is `data`; extraction
/// offsets are byte positions inside it.
#[derive(Debug, Clone)]
pub struct Event {
    /// 0-based position in the stream
    pub num: u64,
    /// Timestamp in nanoseconds since the Unix epoch
    pub ts: u64,
    /// Name of the event source that produced the event
    pub source: String,
    /// Numeric event type
    pub event_type: u16,
    /// Raw event data
    pub data: Vec<u8>,
    /// Host context, when requested at open time
    pub platform: Option<PlatformInfo>,
    /// The plugin that generated the event, for live sources
    pub source_plugin: Option<PluginHandle>,
}

impl Event {
    /// Event data as (lossy) UTF-8 text
    pub fn data_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
