//! `test_source`: generates `tick=<n>` events and extracts the tick back
//!
//! The configuration is the number of events to generate (3 when empty).
//! Events are delivered one per batch with an empty batch between two
//! events, so consumers see a `Timeout` between consecutive ticks.

use inspect_engine::{
    ArgSpec, Capabilities, Capability, EventBatch, ExtractRequest, ExtractedValue, FieldInfo,
    FieldType, FieldValue, Plugin, PluginDescriptor, SourceError, SourceInstance,
};

/// Event source generated and understood by the plugin
pub const SOURCE: &str = "test_source";

/// Plugin descriptor
pub static TEST_SOURCE: PluginDescriptor = PluginDescriptor {
    name: "test_source",
    version: "0.1.0",
    description: "ticks with a timeout between events",
    capabilities: Capabilities::of(Capability::EventSourcing).with(Capability::FieldExtraction),
    event_source: Some(SOURCE),
    extract_event_sources: &[SOURCE],
    fields: &[FieldInfo {
        name: "test.tick",
        field_type: FieldType::Uint64,
        is_list: false,
        arg: ArgSpec::NONE,
        description: "tick number of the event",
    }],
    init,
};

struct TestSource {
    count: u64,
}

fn init(config: &str) -> anyhow::Result<Box<dyn Plugin>> {
    let count = match config.trim() {
        "" => 3,
        n => n
            .parse()
            .map_err(|_| anyhow::anyhow!("expected an event count, got {:?}", config))?,
    };
    Ok(Box::new(TestSource { count }))
}

impl Plugin for TestSource {
    fn open(&mut self, _params: &str) -> anyhow::Result<Box<dyn SourceInstance>> {
        Ok(Box::new(Ticks {
            next: 0,
            count: self.count,
            idle: false,
        }))
    }

    fn event_to_string(&mut self, event: &inspect_engine::Event) -> anyhow::Result<String> {
        Ok(format!("test_source event: {}", event.data_str()))
    }

    fn extract(&mut self, request: &ExtractRequest<'_>) -> anyhow::Result<Vec<ExtractedValue>> {
        let text = std::str::from_utf8(&request.event.data)?;
        let Some(tick) = text.strip_prefix("tick=") else {
            return Ok(Vec::new());
        };
        let value: u64 = tick.parse()?;
        Ok(vec![ExtractedValue::at(
            FieldValue::U64(value),
            "tick=".len(),
            tick.len(),
        )])
    }
}

struct Ticks {
    next: u64,
    count: u64,
    idle: bool,
}

impl SourceInstance for Ticks {
    fn next_batch(&mut self, batch: &mut EventBatch) -> Result<(), SourceError> {
        if self.next >= self.count {
            return Err(SourceError::Eof);
        }
        self.idle = !self.idle;
        if self.idle {
            batch.push(format!("tick={}", self.next));
            self.next += 1;
        }
        Ok(())
    }
}
