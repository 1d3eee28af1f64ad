//! In-process event inspection engine
//!
//! This crate hosts plugins, replays capture files or pulls events from
//! plugin sources, and extracts named fields from the current event:
//!
//! - [`engine`]: the non-reentrant [`Engine`] holding one current event
//! - [`plugin`] / [`registry`]: the plugin API and shared plugin handles
//! - [`source`] / [`capture`]: event sources and the capture file format
//! - [`field`] / [`filtercheck`]: field syntax and extractor factories
//! - [`metrics`]: point-in-time metric snapshots
//!
//! ```no_run
//! use inspect_engine::{Engine, EngineOptions, Status};
//!
//! # fn main() -> inspect_engine::Result<()> {
//! let mut engine = Engine::new(EngineOptions::default())?;
//! engine.open_capture_file("trace.cap")?;
//! while engine.next() == Status::Ok {
//!     if let Some(event) = engine.current() {
//!         println!("{} {}", event.num, event.data_str());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod capture;
pub mod engine;
pub mod error;
pub mod event;
pub mod field;
pub mod filtercheck;
pub mod metrics;
pub mod plugin;
pub mod registry;
pub mod source;
pub mod value;

pub use capture::{CaptureReader, CaptureRecord, CaptureWriter};
pub use engine::{Engine, EngineCounters, EngineOptions};
pub use error::{Error, Result};
pub use event::{Event, PlatformInfo, Status};
pub use field::FieldRef;
pub use filtercheck::{
    ExtractorFactory, FieldExtractor, GENERIC_FIELDS, GenericFieldFactory, PluginFieldFactory,
};
pub use metrics::{MetricFlags, MetricsCollector};
pub use plugin::{
    ArgSpec, Capabilities, Capability, EventBatch, ExtractRequest, FieldInfo, MetricType,
    MetricValue, Plugin, PluginDescriptor, PluginMetric, SourceError, SourceInstance,
};
pub use registry::PluginHandle;
pub use value::{ExtractedValue, FieldType, FieldValue, Offset};
