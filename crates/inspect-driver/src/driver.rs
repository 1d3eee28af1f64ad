//! The test driver
//!
//! A [`Driver`] owns one engine, one extractor registry and one metrics
//! collector. Every public operation takes the process-wide engine lock for
//! its whole duration, so drivers on different threads never touch the
//! engine concurrently. Public methods never call each other: the lock is
//! not reentrant.

use crate::error::{Error, Result};
use crate::extractors::ExtractorRegistry;
use crate::lock;
use crate::logging;
use crate::metrics::{Metric, copy_snapshot};
use inspect_config::DriverConfig;
use inspect_engine::{
    Capability, Engine, EngineOptions, Event, GenericFieldFactory, MetricFlags, MetricsCollector,
    Offset, PluginDescriptor, PluginFieldFactory, PluginHandle, Status,
};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

static NEXT_DRIVER_ID: AtomicU64 = AtomicU64::new(1);

/// Capture state of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaptureState {
    /// No source opened yet
    Idle,
    /// A source is open
    Capturing,
}

impl CaptureState {
    fn is_valid_transition(from: CaptureState, to: CaptureState) -> bool {
        use CaptureState::*;

        matches!((from, to), (Idle, Capturing))
    }
}

/// Reference to the driver's current event
///
/// Valid until the next call to [`Driver::next`]. A handle without a
/// sequence number is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle {
    driver: u64,
    seq: Option<u64>,
}

impl EventHandle {
    fn null(driver: u64) -> Self {
        Self { driver, seq: None }
    }

    /// Whether the handle refers to no event
    pub fn is_null(&self) -> bool {
        self.seq.is_none()
    }

    /// Stream position of the referenced event
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }
}

/// Serialized access to one inspection engine
pub struct Driver {
    id: u64,
    engine: Engine,
    extractors: ExtractorRegistry,
    metrics: MetricsCollector,
    state: CaptureState,
}

impl Driver {
    /// Create a driver with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&DriverConfig::default())
    }

    /// Create a driver following `config`
    pub fn with_config(config: &DriverConfig) -> Result<Self> {
        config.validate()?;
        let _guard = lock::acquire();
        logging::init(&config.log_level);

        let engine = Engine::new(EngineOptions {
            hostname: config.engine.hostname.clone(),
        })?;
        let metrics = MetricsCollector::new(MetricFlags {
            plugins: config.metrics.plugins,
            engine: config.metrics.engine,
        });

        let id = NEXT_DRIVER_ID.fetch_add(1, Ordering::Relaxed);
        debug!("Created driver {}", id);
        Ok(Self {
            id,
            engine,
            extractors: ExtractorRegistry::new(),
            metrics,
            state: CaptureState::Idle,
        })
    }

    /// Current capture state
    pub fn capture_state(&self) -> CaptureState {
        self.state
    }

    /// Register a plugin and initialize it with `config`
    pub fn register_plugin(
        &mut self,
        descriptor: &'static PluginDescriptor,
        config: &str,
    ) -> Result<PluginHandle> {
        let _guard = lock::acquire();
        let plugin = self
            .engine
            .register_plugin(descriptor, config)
            .map_err(Error::from_registration)?;
        info!(
            "Driver {} registered plugin {} {}",
            self.id,
            plugin.name(),
            plugin.version()
        );
        Ok(plugin)
    }

    /// Make the fields of `plugin` available for events of `source`
    ///
    /// Does nothing unless the plugin extracts fields and is compatible
    /// with `source`.
    pub fn add_extractors(&mut self, plugin: &PluginHandle, source: &str) {
        let _guard = lock::acquire();
        if !plugin.has_capability(Capability::FieldExtraction) {
            debug!("Plugin {} does not extract fields", plugin.name());
            return;
        }
        if !plugin.is_source_compatible(source) {
            debug!(
                "Plugin {} is not compatible with source {}",
                plugin.name(),
                source
            );
            return;
        }

        self.extractors.add_factory(Box::new(GenericFieldFactory));
        if let Some(factory) = PluginFieldFactory::new(plugin.clone()) {
            if self.extractors.add_factory(Box::new(factory)) {
                info!("Added extractors of plugin {} for {}", plugin.name(), source);
            }
        }
    }

    fn begin_capture(&self) -> Result<()> {
        let to = CaptureState::Capturing;
        if !CaptureState::is_valid_transition(self.state, to) {
            return Err(Error::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }

    /// Start replaying a capture file
    pub fn open_capture_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let _guard = lock::acquire();
        self.begin_capture()?;
        self.engine
            .open_capture_file(path.as_ref())
            .map_err(Error::from_open)?;
        self.state = CaptureState::Capturing;
        Ok(())
    }

    /// Start a live capture from the plugin named `name`
    ///
    /// `params` is passed to the plugin's `open`. With `platform` set, every
    /// event carries host metadata visible through `platform.*` fields.
    pub fn open_plugin_source(&mut self, name: &str, params: &str, platform: bool) -> Result<()> {
        let _guard = lock::acquire();
        self.begin_capture()?;
        self.engine
            .open_plugin(name, params, platform)
            .map_err(Error::from_open)?;
        self.state = CaptureState::Capturing;
        Ok(())
    }

    /// Advance to the next event
    pub fn next(&mut self) -> (Status, EventHandle) {
        let _guard = lock::acquire();
        if self.state == CaptureState::Idle {
            warn!("Driver {}: next() called before opening a source", self.id);
            return (Status::Error, EventHandle::null(self.id));
        }

        let status = self.engine.next();
        let seq = match status {
            Status::Ok => self.engine.current().map(|event| event.num),
            _ => None,
        };
        (
            status,
            EventHandle {
                driver: self.id,
                seq,
            },
        )
    }

    /// Extract `field` from the event behind `handle` as a string
    pub fn extract_field_as_string(&mut self, field: &str, handle: &EventHandle) -> Result<String> {
        let _guard = lock::acquire();
        let (value, _) = self.extract(field, handle, false)?;
        Ok(value)
    }

    /// Extract `field` along with the byte range it was taken from
    ///
    /// Returns `(value, start, length)`. When the extractor reports no
    /// range the range is `(0, 0)`.
    pub fn extract_field_with_offsets(
        &mut self,
        field: &str,
        handle: &EventHandle,
    ) -> Result<(String, u32, u32)> {
        let _guard = lock::acquire();
        let (value, offset) = self.extract(field, handle, true)?;
        Ok((value, offset.start, offset.length))
    }

    fn extract(
        &mut self,
        field: &str,
        handle: &EventHandle,
        offsets: bool,
    ) -> Result<(String, Offset)> {
        let extractor = self.extractors.resolve(field)?;
        let event = current_event(&self.engine, self.id, handle)?;

        let failed = |e: anyhow::Error| Error::Extraction {
            field: field.to_string(),
            message: e.to_string(),
        };

        let value = extractor
            .render(event)
            .map_err(&failed)?
            .ok_or_else(|| Error::NullValue(field.to_string()))?;
        if !offsets {
            return Ok((value, Offset::default()));
        }

        let offset = extractor
            .extract_with_offsets(event)
            .map_err(&failed)?
            .first()
            .and_then(|v| v.offset)
            .unwrap_or_default();
        Ok((value, offset))
    }

    /// Snapshot engine and plugin metrics
    pub fn get_metrics(&mut self) -> Vec<Metric> {
        let _guard = lock::acquire();
        self.metrics.snapshot(&self.engine);
        copy_snapshot(&self.metrics)
    }
}

fn current_event<'a>(engine: &'a Engine, driver: u64, handle: &EventHandle) -> Result<&'a Event> {
    let seq = handle.seq.ok_or(Error::NullEvent)?;
    if handle.driver != driver {
        return Err(Error::StaleEvent);
    }
    engine
        .current()
        .filter(|event| event.num == seq)
        .ok_or(Error::StaleEvent)
}

impl Drop for Driver {
    fn drop(&mut self) {
        let _guard = lock::acquire();
        self.extractors.clear();
        self.engine.shutdown();
        debug!("Dropped driver {}", self.id);
    }
}
