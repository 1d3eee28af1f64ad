//! `countdown`: a source plugin counting down to zero
//!
//! Configuration is a JSON object `{"remaining": N, "batch_size": M}`; an
//! empty string selects the defaults. Every event reads
//! `"<n> events remaining"`.

use anyhow::Context;
use inspect_engine::{
    Capabilities, Capability, EventBatch, Plugin, PluginDescriptor, PluginMetric, SourceError,
    SourceInstance,
};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Event source generated by the plugin
pub const SOURCE: &str = "countdown";

/// Plugin descriptor
pub static COUNTDOWN: PluginDescriptor = PluginDescriptor {
    name: "countdown",
    version: "0.1.0",
    description: "counts down to zero in batches",
    capabilities: Capabilities::of(Capability::EventSourcing),
    event_source: Some(SOURCE),
    extract_event_sources: &[],
    fields: &[],
    init,
};

/// Parsed configuration
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CountdownConfig {
    /// Number of events to produce
    #[serde(default = "default_remaining")]
    pub remaining: u64,
    /// Maximum events per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            remaining: default_remaining(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_remaining() -> u64 {
    5
}

fn default_batch_size() -> u64 {
    2
}

#[derive(Debug, Default)]
struct Stats {
    batches: AtomicU64,
    events: AtomicU64,
}

struct Countdown {
    config: CountdownConfig,
    stats: Arc<Stats>,
}

fn init(config: &str) -> anyhow::Result<Box<dyn Plugin>> {
    let config = if config.trim().is_empty() {
        CountdownConfig::default()
    } else {
        serde_json::from_str(config).context("invalid countdown config")?
    };
    if config.batch_size == 0 {
        anyhow::bail!("batch_size must be at least 1");
    }
    debug!(
        "countdown: {} events in batches of {}",
        config.remaining, config.batch_size
    );
    Ok(Box::new(Countdown {
        config,
        stats: Arc::default(),
    }))
}

impl Plugin for Countdown {
    fn open(&mut self, _params: &str) -> anyhow::Result<Box<dyn SourceInstance>> {
        Ok(Box::new(CountdownInstance {
            remaining: self.config.remaining,
            batch_size: self.config.batch_size,
            stats: self.stats.clone(),
        }))
    }

    fn metrics(&mut self) -> Vec<PluginMetric> {
        vec![
            PluginMetric::counter(
                "next_batch_call_count",
                self.stats.batches.load(Ordering::Relaxed),
            ),
            PluginMetric::counter("events_produced", self.stats.events.load(Ordering::Relaxed)),
        ]
    }
}

struct CountdownInstance {
    remaining: u64,
    batch_size: u64,
    stats: Arc<Stats>,
}

impl SourceInstance for CountdownInstance {
    fn next_batch(&mut self, batch: &mut EventBatch) -> Result<(), SourceError> {
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        if self.remaining == 0 {
            return Err(SourceError::Eof);
        }

        let size = self.remaining.min(self.batch_size);
        for _ in 0..size {
            self.remaining -= 1;
            self.stats.events.fetch_add(1, Ordering::Relaxed);
            batch.push(format!("{} events remaining", self.remaining));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parsing() {
        assert!((COUNTDOWN.init)("").is_ok());
        assert!((COUNTDOWN.init)(r#"{"remaining": 3, "batch_size": 1}"#).is_ok());
        assert!((COUNTDOWN.init)(r#"{"remaining": 3}"#).is_ok());

        let err = (COUNTDOWN.init)(r#"{"batch_size": 0}"#).err().unwrap();
        assert_eq!(err.to_string(), "batch_size must be at least 1");
        assert!((COUNTDOWN.init)("not json").is_err());
        assert!((COUNTDOWN.init)(r#"{"remaning": 3}"#).is_err());
    }

    #[test]
    fn test_batches_and_metrics() {
        let mut plugin = (COUNTDOWN.init)(r#"{"remaining": 3, "batch_size": 2}"#).unwrap();
        let mut instance = plugin.open("").unwrap();

        let mut batch = EventBatch::default();
        instance.next_batch(&mut batch).unwrap();
        let first: Vec<_> = batch.drain().map(|e| e.data).collect();
        assert_eq!(
            first,
            vec![b"2 events remaining".to_vec(), b"1 events remaining".to_vec()]
        );

        instance.next_batch(&mut batch).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(matches!(
            instance.next_batch(&mut batch),
            Err(SourceError::Eof)
        ));

        let metrics = plugin.metrics();
        assert_eq!(metrics[0].name, "next_batch_call_count");
        assert_eq!(metrics[0].value.as_u64(), 3);
        assert_eq!(metrics[1].name, "events_produced");
        assert_eq!(metrics[1].value.as_u64(), 3);
    }
}
