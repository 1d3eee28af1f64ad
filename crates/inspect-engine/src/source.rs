//! Event sources: capture replay and plugin-driven live sources

use crate::capture::{CaptureReader, CaptureRecord};
use crate::error::Result;
use crate::event::PLUGIN_EVENT;
use crate::plugin::{BatchEvent, EventBatch, SourceError, SourceInstance};
use crate::registry::PluginHandle;
use chrono::Utc;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, warn};

/// An event as it leaves a source, before the engine numbers it
#[derive(Debug)]
pub struct RawEvent {
    /// Timestamp in nanoseconds
    pub ts: u64,
    /// Source name
    pub source: String,
    /// Numeric event type
    pub event_type: u16,
    /// Event data
    pub data: Vec<u8>,
    /// Generating plugin, for live sources
    pub plugin: Option<PluginHandle>,
}

/// Result of pulling one event from a source
#[derive(Debug)]
pub enum SourceStep {
    /// An event
    Event(RawEvent),
    /// Nothing available yet
    Timeout,
    /// Stream exhausted
    Eof,
    /// The source failed
    Failed(String),
}

/// A stream of events the engine can capture from
pub trait EventSource: Send {
    /// Human readable name, used in logs
    fn name(&self) -> &str;

    /// Pull the next event
    fn next_event(&mut self) -> SourceStep;
}

/// Replays a capture file
#[derive(Debug)]
pub struct CaptureSource {
    path: String,
    records: VecDeque<CaptureRecord>,
}

impl CaptureSource {
    /// Load the capture file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = CaptureReader::open(path)?;
        debug!(
            "Capture {} was recorded at {}",
            path.display(),
            reader.header().created_at
        );
        let records = reader.into_records();
        Ok(Self {
            path: path.display().to_string(),
            records: records.into(),
        })
    }
}

impl EventSource for CaptureSource {
    fn name(&self) -> &str {
        &self.path
    }

    fn next_event(&mut self) -> SourceStep {
        match self.records.pop_front() {
            Some(record) => SourceStep::Event(RawEvent {
                ts: record.ts,
                source: record.source,
                event_type: record.event_type,
                data: record.data.into_bytes(),
                plugin: None,
            }),
            None => SourceStep::Eof,
        }
    }
}

/// Pulls batches from a plugin's source instance
pub struct PluginSource {
    plugin: PluginHandle,
    source: String,
    instance: Box<dyn SourceInstance>,
    batch: EventBatch,
    pending: VecDeque<BatchEvent>,
    batches: u64,
}

impl PluginSource {
    /// Wrap an opened instance of `plugin`
    pub fn new(plugin: PluginHandle, source: &str, instance: Box<dyn SourceInstance>) -> Self {
        Self {
            plugin,
            source: source.to_string(),
            instance,
            batch: EventBatch::default(),
            pending: VecDeque::new(),
            batches: 0,
        }
    }

    fn refill(&mut self) -> Option<SourceStep> {
        self.batch.clear();
        match self.instance.next_batch(&mut self.batch) {
            Ok(()) => {
                self.batches += 1;
                if self.batch.is_empty() {
                    return Some(SourceStep::Timeout);
                }
                debug!(
                    "Plugin {} delivered batch {} with {} events",
                    self.plugin.name(),
                    self.batches,
                    self.batch.len()
                );
                self.pending.extend(self.batch.drain());
                None
            }
            Err(SourceError::Eof) => Some(SourceStep::Eof),
            Err(SourceError::Timeout) => Some(SourceStep::Timeout),
            Err(SourceError::Failure(e)) => {
                warn!("Plugin {} source failed: {:#}", self.plugin.name(), e);
                Some(SourceStep::Failed(e.to_string()))
            }
        }
    }
}

impl EventSource for PluginSource {
    fn name(&self) -> &str {
        &self.source
    }

    fn next_event(&mut self) -> SourceStep {
        if self.pending.is_empty() {
            if let Some(step) = self.refill() {
                return step;
            }
        }

        match self.pending.pop_front() {
            Some(event) => SourceStep::Event(RawEvent {
                ts: event.ts.unwrap_or_else(now_nanos),
                source: self.source.clone(),
                event_type: PLUGIN_EVENT,
                data: event.data,
                plugin: Some(self.plugin.clone()),
            }),
            None => SourceStep::Timeout,
        }
    }
}

impl Drop for PluginSource {
    fn drop(&mut self) {
        debug!("Closing source instance of plugin {}", self.plugin.name());
        self.instance.close();
    }
}

fn now_nanos() -> u64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default().max(0) as u64
}
