//! `dummy`: a source plugin picky about its configuration
//!
//! Initialization only succeeds with the configuration string `testing`.
//! Opening with the parameters `fail` is rejected; any other open yields a
//! source that is exhausted from the start.

use inspect_engine::{
    Capabilities, Capability, Event, EventBatch, Plugin, PluginDescriptor, SourceError,
    SourceInstance,
};

/// The only configuration accepted
pub const ACCEPTED_CONFIG: &str = "testing";

/// Plugin descriptor
pub static STRICT: PluginDescriptor = PluginDescriptor {
    name: "dummy",
    version: "0.1.0",
    description: "accepts a single configuration string",
    capabilities: Capabilities::of(Capability::EventSourcing),
    event_source: Some("dummy"),
    extract_event_sources: &[],
    fields: &[],
    init,
};

struct Strict;

fn init(config: &str) -> anyhow::Result<Box<dyn Plugin>> {
    if config != ACCEPTED_CONFIG {
        anyhow::bail!("I only accept \"{}\" as the config string", ACCEPTED_CONFIG);
    }
    Ok(Box::new(Strict))
}

impl Plugin for Strict {
    fn open(&mut self, params: &str) -> anyhow::Result<Box<dyn SourceInstance>> {
        if params == "fail" {
            anyhow::bail!("failed!");
        }
        Ok(Box::new(Exhausted))
    }

    fn event_to_string(&mut self, _event: &Event) -> anyhow::Result<String> {
        Ok("what event?".to_string())
    }
}

struct Exhausted;

impl SourceInstance for Exhausted {
    fn next_batch(&mut self, _batch: &mut EventBatch) -> Result<(), SourceError> {
        Err(SourceError::Eof)
    }
}
