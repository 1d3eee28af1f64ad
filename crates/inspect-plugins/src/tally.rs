//! `tally`: counts the events it sees on every source

use inspect_engine::{
    ArgSpec, Capabilities, Capability, Event, ExtractRequest, ExtractedValue, FieldInfo,
    FieldType, FieldValue, Plugin, PluginDescriptor, PluginMetric,
};
use std::collections::HashMap;

/// Plugin descriptor
pub static TALLY: PluginDescriptor = PluginDescriptor {
    name: "tally",
    version: "0.1.0",
    description: "counts parsed events per source",
    capabilities: Capabilities::of(Capability::EventParsing).with(Capability::FieldExtraction),
    event_source: None,
    extract_event_sources: &[],
    fields: &[
        FieldInfo {
            name: "tally.seen",
            field_type: FieldType::Uint64,
            is_list: false,
            arg: ArgSpec::NONE,
            description: "events parsed so far on the event's source",
        },
        FieldInfo {
            name: "tally.source",
            field_type: FieldType::Uint64,
            is_list: false,
            arg: ArgSpec::KEY,
            description: "events parsed so far on the named source",
        },
    ],
    init,
};

#[derive(Default)]
struct Tally {
    per_source: HashMap<String, u64>,
    parsed: u64,
}

fn init(_config: &str) -> anyhow::Result<Box<dyn Plugin>> {
    Ok(Box::<Tally>::default())
}

impl Plugin for Tally {
    fn parse_event(&mut self, event: &Event) -> anyhow::Result<()> {
        *self.per_source.entry(event.source.clone()).or_default() += 1;
        self.parsed += 1;
        Ok(())
    }

    fn extract(&mut self, request: &ExtractRequest<'_>) -> anyhow::Result<Vec<ExtractedValue>> {
        let source = match request.arg_key {
            Some(key) => key,
            None => request.event.source.as_str(),
        };
        let seen = self.per_source.get(source).copied().unwrap_or_default();
        Ok(vec![ExtractedValue::new(FieldValue::U64(seen))])
    }

    fn metrics(&mut self) -> Vec<PluginMetric> {
        vec![
            PluginMetric::counter("events_parsed", self.parsed),
            PluginMetric::gauge(
                "sources",
                inspect_engine::MetricValue::U32(self.per_source.len() as u32),
            ),
        ]
    }
}
