//! Plugin API
//!
//! A plugin is described by a static [`PluginDescriptor`] and instantiated
//! through its `init` function with a configuration string. The descriptor
//! declares what the plugin can do ([`Capabilities`]), which event source it
//! generates, which sources it can extract fields from and its field table.

use crate::event::Event;
use crate::field::FieldRef;
use crate::value::{ExtractedValue, FieldType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single plugin capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Generates events from an event source
    EventSourcing,
    /// Extracts fields from events
    FieldExtraction,
    /// Observes every event before it is delivered
    EventParsing,
}

impl Capability {
    const ALL: [Capability; 3] = [
        Capability::EventSourcing,
        Capability::FieldExtraction,
        Capability::EventParsing,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of capabilities declared by a plugin
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// The empty set
    pub const NONE: Capabilities = Capabilities(0);

    /// A set holding a single capability
    pub const fn of(capability: Capability) -> Self {
        Capabilities(capability.bit())
    }

    /// This set plus `capability`
    pub const fn with(self, capability: Capability) -> Self {
        Capabilities(self.0 | capability.bit())
    }

    /// Whether the set holds `capability`
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Whether the set is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the capabilities in the set
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Accepted argument forms of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgSpec {
    /// Accepts a numeric index
    pub index: bool,
    /// Accepts a string key
    pub key: bool,
    /// The argument must be present
    pub required: bool,
}

impl ArgSpec {
    /// The field takes no argument
    pub const NONE: ArgSpec = ArgSpec {
        index: false,
        key: false,
        required: false,
    };

    /// The field requires a numeric index
    pub const INDEX: ArgSpec = ArgSpec {
        index: true,
        key: false,
        required: true,
    };

    /// The field requires a key
    pub const KEY: ArgSpec = ArgSpec {
        index: false,
        key: true,
        required: true,
    };

    /// Whether the field accepts any argument at all
    pub const fn accepts_arg(&self) -> bool {
        self.index || self.key
    }
}

/// One entry of a plugin's field table
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Full field name, e.g. `payload.data`
    pub name: &'static str,
    /// Value type
    pub field_type: FieldType,
    /// The field may produce several values
    pub is_list: bool,
    /// Argument forms
    pub arg: ArgSpec,
    /// Human readable description
    pub description: &'static str,
}

/// Plugin constructor: receives the configuration string
pub type PluginInit = fn(&str) -> anyhow::Result<Box<dyn Plugin>>;

/// Static description of a plugin
pub struct PluginDescriptor {
    /// Unique plugin name
    pub name: &'static str,
    /// Plugin version
    pub version: &'static str,
    /// Short description
    pub description: &'static str,
    /// Declared capabilities
    pub capabilities: Capabilities,
    /// Name of the event source the plugin generates, if any
    pub event_source: Option<&'static str>,
    /// Event sources the plugin can extract fields from
    pub extract_event_sources: &'static [&'static str],
    /// Field table
    pub fields: &'static [FieldInfo],
    /// Constructor
    pub init: PluginInit,
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("capabilities", &self.capabilities)
            .field("event_source", &self.event_source)
            .field("extract_event_sources", &self.extract_event_sources)
            .finish_non_exhaustive()
    }
}

/// Everything a plugin needs to extract one field from one event
#[derive(Debug)]
pub struct ExtractRequest<'a> {
    /// Position of the field in the plugin's field table
    pub field_id: usize,
    /// The field table entry
    pub field: &'static FieldInfo,
    /// Numeric argument, when the field takes an index
    pub arg_index: Option<u64>,
    /// String argument, when the field takes a key
    pub arg_key: Option<&'a str>,
    /// The event
    pub event: &'a Event,
    /// The caller wants byte offsets for the values
    pub offsets_requested: bool,
}

/// Monotonicity of a plugin metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    /// Only ever grows
    Monotonic,
    /// May go up and down
    NonMonotonic,
}

/// Raw metric value as reported by a plugin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    /// 32-bit unsigned
    U32(u32),
    /// 32-bit signed
    S32(i32),
    /// 64-bit unsigned
    U64(u64),
    /// 64-bit signed
    I64(i64),
    /// Double precision float
    Double(f64),
    /// Single precision float
    Float(f32),
    /// Native integer
    Int(isize),
}

impl MetricValue {
    /// Convert to `u64` with plain numeric casts
    pub fn as_u64(self) -> u64 {
        match self {
            MetricValue::U32(v) => v as u64,
            MetricValue::S32(v) => v as u64,
            MetricValue::U64(v) => v,
            MetricValue::I64(v) => v as u64,
            MetricValue::Double(v) => v as u64,
            MetricValue::Float(v) => v as u64,
            MetricValue::Int(v) => v as u64,
        }
    }
}

/// A metric reported by a plugin
#[derive(Debug, Clone, PartialEq)]
pub struct PluginMetric {
    /// Metric name, without the plugin prefix
    pub name: String,
    /// Monotonicity
    pub metric_type: MetricType,
    /// Current value
    pub value: MetricValue,
}

impl PluginMetric {
    /// A monotonic counter
    pub fn counter(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Monotonic,
            value: MetricValue::U64(value),
        }
    }

    /// A non-monotonic gauge
    pub fn gauge(name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::NonMonotonic,
            value,
        }
    }
}

/// An initialized plugin
///
/// Every method has a default so plugins only implement what their
/// capabilities require.
pub trait Plugin: Send {
    /// Open a new event source instance
    fn open(&mut self, params: &str) -> anyhow::Result<Box<dyn SourceInstance>> {
        let _ = params;
        anyhow::bail!("plugin does not generate events")
    }

    /// Render an event produced by this plugin as text
    fn event_to_string(&mut self, event: &Event) -> anyhow::Result<String> {
        Ok(event.data_str().into_owned())
    }

    /// Extract the requested field; an empty list means no value
    fn extract(&mut self, request: &ExtractRequest<'_>) -> anyhow::Result<Vec<ExtractedValue>> {
        let _ = request;
        Ok(Vec::new())
    }

    /// Observe an event before it is delivered
    fn parse_event(&mut self, event: &Event) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }

    /// Current metric values
    fn metrics(&mut self) -> Vec<PluginMetric> {
        Vec::new()
    }
}

/// Why a source instance produced no batch
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// No more events will be produced
    #[error("end of stream")]
    Eof,

    /// Nothing available right now
    #[error("timed out waiting for events")]
    Timeout,

    /// The source failed
    #[error(transparent)]
    Failure(#[from] anyhow::Error),
}

/// One event in a batch, as produced by a source instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEvent {
    /// Timestamp in nanoseconds, stamped on delivery when absent
    pub ts: Option<u64>,
    /// Raw event data
    pub data: Vec<u8>,
}

/// A batch of events filled by [`SourceInstance::next_batch`]
#[derive(Debug, Default)]
pub struct EventBatch {
    events: Vec<BatchEvent>,
}

impl EventBatch {
    /// Append an event stamped on delivery
    pub fn push(&mut self, data: impl Into<Vec<u8>>) {
        self.events.push(BatchEvent {
            ts: None,
            data: data.into(),
        });
    }

    /// Append an event with an explicit timestamp
    pub fn push_at(&mut self, ts: u64, data: impl Into<Vec<u8>>) {
        self.events.push(BatchEvent {
            ts: Some(ts),
            data: data.into(),
        });
    }

    /// Number of events in the batch
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove and return all events
    pub fn drain(&mut self) -> std::vec::Drain<'_, BatchEvent> {
        self.events.drain(..)
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}

/// An open event source of a plugin
pub trait SourceInstance: Send {
    /// Fill `batch` with the next events
    fn next_batch(&mut self, batch: &mut EventBatch) -> Result<(), SourceError>;

    /// Release the instance
    fn close(&mut self) {}
}

impl<'a> ExtractRequest<'a> {
    /// Build a request for `field` of `info`
    ///
    /// A numeric argument is passed as an index when the field accepts
    /// indexes; anything else is passed as a key when keys are accepted.
    pub fn new(
        field_id: usize,
        info: &'static FieldInfo,
        field: &'a FieldRef,
        event: &'a Event,
        offsets_requested: bool,
    ) -> Self {
        let arg_index = if info.arg.index { field.arg_index() } else { None };
        let arg_key = match (&field.arg, arg_index) {
            (Some(arg), None) if info.arg.key => Some(arg.as_str()),
            _ => None,
        };
        Self {
            field_id,
            field: info,
            arg_index,
            arg_key,
            event,
            offsets_requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set() {
        let caps = Capabilities::of(Capability::EventSourcing).with(Capability::FieldExtraction);
        assert!(caps.contains(Capability::EventSourcing));
        assert!(caps.contains(Capability::FieldExtraction));
        assert!(!caps.contains(Capability::EventParsing));
        assert!(!caps.is_empty());
        assert!(Capabilities::NONE.is_empty());
        assert_eq!(
            caps.iter().collect::<Vec<_>>(),
            vec![Capability::EventSourcing, Capability::FieldExtraction]
        );
    }

    #[test]
    fn test_metric_value_casts() {
        assert_eq!(MetricValue::U32(7).as_u64(), 7);
        assert_eq!(MetricValue::Double(3.9).as_u64(), 3);
        assert_eq!(MetricValue::Float(2.5).as_u64(), 2);
        assert_eq!(MetricValue::S32(-1).as_u64(), u64::MAX);
        assert_eq!(MetricValue::I64(12).as_u64(), 12);
    }

    #[test]
    fn test_batch_drain() {
        let mut batch = EventBatch::default();
        batch.push("a");
        batch.push_at(5, b"b".to_vec());
        assert_eq!(batch.len(), 2);
        let events: Vec<_> = batch.drain().collect();
        assert_eq!(events[1].ts, Some(5));
        assert!(batch.is_empty());
    }
}
