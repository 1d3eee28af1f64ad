//! `payload`: field extraction over countdown events

use inspect_engine::{
    ArgSpec, Capabilities, Capability, ExtractRequest, ExtractedValue, FieldInfo, FieldType,
    FieldValue, Plugin, PluginDescriptor,
};

/// Largest repeat count accepted by `payload.repeated`
pub const MAX_REPEAT: u64 = 64;

/// Plugin descriptor
pub static PAYLOAD: PluginDescriptor = PluginDescriptor {
    name: "payload",
    version: "0.1.0",
    description: "extracts fields from countdown payloads",
    capabilities: Capabilities::of(Capability::FieldExtraction),
    event_source: None,
    extract_event_sources: &[crate::countdown::SOURCE],
    fields: &FIELDS,
    init,
};

const FIELDS: [FieldInfo; 5] = [
    FieldInfo {
        name: "payload.data",
        field_type: FieldType::String,
        is_list: false,
        arg: ArgSpec::NONE,
        description: "the whole payload",
    },
    FieldInfo {
        name: "payload.data_with_range",
        field_type: FieldType::String,
        is_list: false,
        arg: ArgSpec::NONE,
        description: "the whole payload, reporting its byte range",
    },
    FieldInfo {
        name: "payload.repeated",
        field_type: FieldType::String,
        is_list: true,
        arg: ArgSpec::INDEX,
        description: "the payload repeated N times",
    },
    FieldInfo {
        name: "payload.remaining",
        field_type: FieldType::Uint64,
        is_list: false,
        arg: ArgSpec::NONE,
        description: "the number of events remaining",
    },
    FieldInfo {
        name: "payload.word",
        field_type: FieldType::String,
        is_list: false,
        arg: ArgSpec::INDEX,
        description: "the N-th space separated word of the payload",
    },
];

struct Payload;

fn init(_config: &str) -> anyhow::Result<Box<dyn Plugin>> {
    Ok(Box::new(Payload))
}

impl Plugin for Payload {
    fn extract(&mut self, request: &ExtractRequest<'_>) -> anyhow::Result<Vec<ExtractedValue>> {
        let payload = std::str::from_utf8(&request.event.data)?;
        let text = || FieldValue::String(payload.to_string());

        let values = match request.field.name {
            "payload.data" => vec![ExtractedValue::new(text())],
            "payload.data_with_range" if request.offsets_requested => {
                vec![ExtractedValue::at(text(), 0, payload.len())]
            }
            "payload.data_with_range" => vec![ExtractedValue::new(text())],
            "payload.repeated" => {
                let reps = request.arg_index.unwrap_or(1);
                if reps > MAX_REPEAT {
                    anyhow::bail!("repeat count {} exceeds {}", reps, MAX_REPEAT);
                }
                (0..reps)
                    .map(|_| ExtractedValue::at(text(), 0, payload.len()))
                    .collect()
            }
            "payload.remaining" => {
                let digits = payload
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(payload.len());
                if digits == 0 {
                    anyhow::bail!("payload {:?} does not start with a number", payload);
                }
                let remaining: u64 = payload[..digits].parse()?;
                vec![ExtractedValue::at(FieldValue::U64(remaining), 0, digits)]
            }
            "payload.word" => {
                let index = request.arg_index.unwrap_or(0) as usize;
                match nth_word(payload, index) {
                    Some((start, word)) => vec![ExtractedValue::at(
                        FieldValue::String(word.to_string()),
                        start,
                        word.len(),
                    )],
                    None => Vec::new(),
                }
            }
            other => anyhow::bail!("unknown field {}", other),
        };
        Ok(values)
    }
}

fn nth_word(text: &str, index: usize) -> Option<(usize, &str)> {
    let mut pos = 0;
    for (i, word) in text.split(' ').enumerate() {
        if i == index {
            return (!word.is_empty()).then_some((pos, word));
        }
        pos += word.len() + 1;
    }
    None
}
