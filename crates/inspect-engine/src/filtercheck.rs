//! Field extractors ("filterchecks") and the factories that build them
//!
//! An extractor is bound to one parsed field name. It renders the field's
//! value as a string and, in a separate pass, returns raw values annotated
//! with the byte range they were taken from.

use crate::event::Event;
use crate::field::FieldRef;
use crate::plugin::{Capability, ExtractRequest, FieldInfo};
use crate::registry::PluginHandle;
use crate::value::{ExtractedValue, FieldValue, render_values};

/// Extracts one field from events
pub trait FieldExtractor: Send {
    /// The field this extractor was built for
    fn field(&self) -> &FieldRef;

    /// Extract raw values, with offsets when `offsets` is set
    fn extract(&mut self, event: &Event, offsets: bool) -> anyhow::Result<Vec<ExtractedValue>>;

    /// Render the field's value, `None` when the event has no value for it
    fn render(&mut self, event: &Event) -> anyhow::Result<Option<String>> {
        Ok(render_values(&self.extract(event, false)?))
    }

    /// Raw values annotated with their byte range in the event data
    fn extract_with_offsets(&mut self, event: &Event) -> anyhow::Result<Vec<ExtractedValue>> {
        self.extract(event, true)
    }
}

/// Builds extractors for the fields it knows
pub trait ExtractorFactory: Send {
    /// Stable identifier, used to avoid registering a factory twice
    fn id(&self) -> String;

    /// Build an extractor for `field`, `None` if the factory does not know it
    fn new_extractor(&self, field: &FieldRef) -> Option<Box<dyn FieldExtractor>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenericField {
    Num,
    Time,
    RawTime,
    Source,
    Type,
    PluginInfo,
    BufLen,
    Data,
    Arg,
    Hostname,
    Os,
    Arch,
}

/// Description of the fields served by [`GenericFieldFactory`]
pub const GENERIC_FIELDS: &[(&str, &str)] = &[
    ("evt.num", "position of the event in the stream"),
    ("evt.time", "event timestamp as RFC 3339"),
    ("evt.rawtime", "event timestamp in nanoseconds"),
    ("evt.source", "name of the event source"),
    ("evt.type", "numeric event type"),
    ("evt.plugininfo", "event rendered by its source plugin"),
    ("evt.buflen", "length of the event data"),
    ("evt.data", "event data as text"),
    ("evt.arg", "value of a key=value token in the event data"),
    ("platform.hostname", "host name, with platform metadata"),
    ("platform.os", "operating system, with platform metadata"),
    ("platform.arch", "CPU architecture, with platform metadata"),
];

impl GenericField {
    fn lookup(name: &str) -> Option<Self> {
        let field = match name {
            "evt.num" => GenericField::Num,
            "evt.time" => GenericField::Time,
            "evt.rawtime" => GenericField::RawTime,
            "evt.source" => GenericField::Source,
            "evt.type" => GenericField::Type,
            "evt.plugininfo" => GenericField::PluginInfo,
            "evt.buflen" => GenericField::BufLen,
            "evt.data" => GenericField::Data,
            "evt.arg" => GenericField::Arg,
            "platform.hostname" => GenericField::Hostname,
            "platform.os" => GenericField::Os,
            "platform.arch" => GenericField::Arch,
            _ => return None,
        };
        Some(field)
    }

    fn takes_arg(self) -> bool {
        self == GenericField::Arg
    }
}

/// Factory for the engine's built-in fields
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericFieldFactory;

impl ExtractorFactory for GenericFieldFactory {
    fn id(&self) -> String {
        "generic".to_string()
    }

    fn new_extractor(&self, field: &FieldRef) -> Option<Box<dyn FieldExtractor>> {
        let kind = GenericField::lookup(&field.name)?;
        if kind.takes_arg() != field.arg.is_some() {
            return None;
        }
        Some(Box::new(GenericExtractor {
            field: field.clone(),
            kind,
        }))
    }
}

struct GenericExtractor {
    field: FieldRef,
    kind: GenericField,
}

impl FieldExtractor for GenericExtractor {
    fn field(&self) -> &FieldRef {
        &self.field
    }

    fn extract(&mut self, event: &Event, _offsets: bool) -> anyhow::Result<Vec<ExtractedValue>> {
        let value = match self.kind {
            GenericField::Num => ExtractedValue::new(FieldValue::U64(event.num)),
            GenericField::Time => ExtractedValue::new(FieldValue::AbsTime(event.ts)),
            GenericField::RawTime => ExtractedValue::new(FieldValue::U64(event.ts)),
            GenericField::Source => ExtractedValue::new(FieldValue::String(event.source.clone())),
            GenericField::Type => ExtractedValue::new(FieldValue::U64(event.event_type as u64)),
            GenericField::PluginInfo => {
                let text = match &event.source_plugin {
                    Some(plugin) => plugin.with_plugin(|p| p.event_to_string(event))?,
                    None => event.data_str().into_owned(),
                };
                ExtractedValue::new(FieldValue::String(text))
            }
            GenericField::BufLen => ExtractedValue::new(FieldValue::U64(event.data.len() as u64)),
            GenericField::Data => ExtractedValue::at(
                FieldValue::String(event.data_str().into_owned()),
                0,
                event.data.len(),
            ),
            GenericField::Arg => {
                let key = self.field.arg.as_deref().unwrap_or_default();
                match find_arg(&event.data, key) {
                    Some((start, value)) => ExtractedValue::at(
                        FieldValue::String(value.to_string()),
                        start,
                        value.len(),
                    ),
                    None => return Ok(Vec::new()),
                }
            }
            GenericField::Hostname | GenericField::Os | GenericField::Arch => {
                let Some(platform) = &event.platform else {
                    return Ok(Vec::new());
                };
                let text = match self.kind {
                    GenericField::Hostname => &platform.hostname,
                    GenericField::Os => &platform.os,
                    _ => &platform.arch,
                };
                ExtractedValue::new(FieldValue::String(text.clone()))
            }
        };
        Ok(vec![value])
    }
}

/// Find the value of `key=value` among the space-separated tokens of `data`
///
/// Returns the byte position of the value and the value itself.
fn find_arg<'a>(data: &'a [u8], key: &str) -> Option<(usize, &'a str)> {
    let text = std::str::from_utf8(data).ok()?;
    let mut pos = 0;
    for token in text.split(' ') {
        if let Some(value) = token.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')) {
            return Some((pos + key.len() + 1, value));
        }
        pos += token.len() + 1;
    }
    None
}

/// Factory for the fields of one plugin
#[derive(Debug, Clone)]
pub struct PluginFieldFactory {
    plugin: PluginHandle,
}

impl PluginFieldFactory {
    /// Create a factory for `plugin`; `None` without the extraction capability
    pub fn new(plugin: PluginHandle) -> Option<Self> {
        plugin
            .has_capability(Capability::FieldExtraction)
            .then_some(Self { plugin })
    }
}

/// Whether `field`'s argument is acceptable for `info`
fn arg_matches(info: &FieldInfo, field: &FieldRef) -> bool {
    match &field.arg {
        None => !info.arg.required,
        Some(arg) => {
            if !info.arg.accepts_arg() {
                return false;
            }
            let is_index = arg.parse::<u64>().is_ok();
            (info.arg.index && is_index) || info.arg.key
        }
    }
}

impl ExtractorFactory for PluginFieldFactory {
    fn id(&self) -> String {
        format!("plugin:{}", self.plugin.name())
    }

    fn new_extractor(&self, field: &FieldRef) -> Option<Box<dyn FieldExtractor>> {
        let (field_id, info) = self
            .plugin
            .fields()
            .iter()
            .enumerate()
            .find(|(_, info)| info.name == field.name)?;
        if !arg_matches(info, field) {
            return None;
        }
        Some(Box::new(PluginExtractor {
            plugin: self.plugin.clone(),
            field: field.clone(),
            field_id,
            info,
        }))
    }
}

struct PluginExtractor {
    plugin: PluginHandle,
    field: FieldRef,
    field_id: usize,
    info: &'static FieldInfo,
}

impl FieldExtractor for PluginExtractor {
    fn field(&self) -> &FieldRef {
        &self.field
    }

    fn extract(&mut self, event: &Event, offsets: bool) -> anyhow::Result<Vec<ExtractedValue>> {
        if !self.plugin.is_source_compatible(&event.source) {
            return Ok(Vec::new());
        }
        let request = ExtractRequest::new(self.field_id, self.info, &self.field, event, offsets);
        let mut values = self.plugin.with_plugin(|p| p.extract(&request))?;
        if !self.info.is_list {
            values.truncate(1);
        }
        Ok(values)
    }
}
