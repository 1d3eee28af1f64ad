//! The inspection engine
//!
//! The engine is not reentrant: it holds one current event at a time and
//! every call mutates shared state. Callers that share an engine across
//! threads must serialize access themselves.

use crate::error::{Error, Result};
use crate::event::{Event, PlatformInfo, Status};
use crate::plugin::{Capability, PluginDescriptor};
use crate::registry::{PluginHandle, PluginRegistry};
use crate::source::{CaptureSource, EventSource, PluginSource, RawEvent, SourceStep};
use std::path::Path;
use tracing::{debug, info, warn};

/// Engine options
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Host name reported in platform metadata instead of the detected one
    pub hostname: Option<String>,
}

/// Counters maintained while capturing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCounters {
    /// Events delivered
    pub n_evts: u64,
    /// Steps that produced no event
    pub n_timeouts: u64,
    /// Events dropped because a parsing plugin failed on them
    pub n_drops: u64,
}

/// Live inspection engine
pub struct Engine {
    options: EngineOptions,
    registry: PluginRegistry,
    source: Option<Box<dyn EventSource>>,
    platform: Option<PlatformInfo>,
    current: Option<Event>,
    next_num: u64,
    finished: Option<Status>,
    counters: EngineCounters,
}

impl Engine {
    /// Create an engine in live mode
    pub fn new(options: EngineOptions) -> Result<Self> {
        debug!("Creating engine in live mode");
        Ok(Self {
            options,
            registry: PluginRegistry::new(),
            source: None,
            platform: None,
            current: None,
            next_num: 0,
            finished: None,
            counters: EngineCounters::default(),
        })
    }

    /// Register and initialize a plugin
    pub fn register_plugin(
        &mut self,
        descriptor: &'static PluginDescriptor,
        config: &str,
    ) -> Result<PluginHandle> {
        self.registry.register(descriptor, config)
    }

    /// Registered plugins, in registration order
    pub fn plugins(&self) -> &[PluginHandle] {
        self.registry.plugins()
    }

    /// Look a registered plugin up by name
    pub fn find_plugin(&self, name: &str) -> Option<&PluginHandle> {
        self.registry.find(name)
    }

    /// Whether a source is open
    pub fn is_capturing(&self) -> bool {
        self.source.is_some()
    }

    /// Start replaying a capture file
    pub fn open_capture_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.is_capturing() {
            return Err(Error::AlreadyCapturing);
        }
        let source = CaptureSource::open(path.as_ref())?;
        info!("Opened capture file {}", path.as_ref().display());
        self.start(Box::new(source), None);
        Ok(())
    }

    /// Start a live capture from the source of the plugin named `name`
    pub fn open_plugin(&mut self, name: &str, params: &str, platform: bool) -> Result<()> {
        if self.is_capturing() {
            return Err(Error::AlreadyCapturing);
        }
        let plugin = self
            .registry
            .find(name)
            .cloned()
            .ok_or_else(|| Error::PluginNotFound(name.to_string()))?;
        let source_name = match plugin.event_source() {
            Some(source) if plugin.has_capability(Capability::EventSourcing) => source,
            _ => return Err(Error::NotASource(name.to_string())),
        };

        let instance = plugin
            .with_plugin(|p| p.open(params))
            .map_err(|e| Error::open(name, e.to_string()))?;

        let platform = platform.then(|| PlatformInfo::detect(self.options.hostname.as_deref()));
        info!(
            "Opened plugin source {} ({}), platform metadata: {}",
            name,
            source_name,
            platform.is_some()
        );
        self.start(
            Box::new(PluginSource::new(plugin, source_name, instance)),
            platform,
        );
        Ok(())
    }

    fn start(&mut self, source: Box<dyn EventSource>, platform: Option<PlatformInfo>) {
        self.source = Some(source);
        self.platform = platform;
        self.current = None;
        self.next_num = 0;
        self.finished = None;
    }

    /// Advance to the next event
    ///
    /// `Eof` and `Error` are sticky: once returned, every later call
    /// returns the same status.
    pub fn next(&mut self) -> Status {
        self.current = None;
        if let Some(status) = self.finished {
            return status;
        }
        let Some(source) = self.source.as_mut() else {
            return Status::Error;
        };

        match source.next_event() {
            SourceStep::Event(raw) => self.deliver(raw),
            SourceStep::Timeout => {
                self.counters.n_timeouts += 1;
                Status::Timeout
            }
            SourceStep::Eof => {
                debug!("Source {} reached end of stream", source.name());
                self.finished = Some(Status::Eof);
                Status::Eof
            }
            SourceStep::Failed(reason) => {
                warn!("Source {} failed: {}", source.name(), reason);
                self.finished = Some(Status::Error);
                Status::Error
            }
        }
    }

    fn deliver(&mut self, raw: RawEvent) -> Status {
        let event = Event {
            num: self.next_num,
            ts: raw.ts,
            source: raw.source,
            event_type: raw.event_type,
            data: raw.data,
            platform: self.platform.clone(),
            source_plugin: raw.plugin,
        };
        self.next_num += 1;

        for plugin in self.registry.plugins() {
            if !plugin.has_capability(Capability::EventParsing)
                || !plugin.is_source_compatible(&event.source)
            {
                continue;
            }
            if let Err(e) = plugin.with_plugin(|p| p.parse_event(&event)) {
                warn!(
                    "Plugin {} failed to parse event {}: {}",
                    plugin.name(),
                    event.num,
                    e
                );
                self.counters.n_drops += 1;
                return Status::Timeout;
            }
        }

        self.counters.n_evts += 1;
        self.current = Some(event);
        Status::Ok
    }

    /// The current event, if the last call to [`next`](Self::next) produced one
    pub fn current(&self) -> Option<&Event> {
        self.current.as_ref()
    }

    /// Capture counters
    pub fn counters(&self) -> EngineCounters {
        self.counters
    }

    /// Close the open source, if any
    pub fn stop_capture(&mut self) {
        if let Some(source) = self.source.take() {
            info!("Stopping capture from {}", source.name());
        }
        self.current = None;
    }

    /// Close the open source and release every plugin
    pub fn shutdown(&mut self) {
        self.stop_capture();
        if !self.registry.is_empty() {
            debug!("Releasing {} plugins", self.registry.len());
        }
        self.registry.clear();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_capture();
    }
}
