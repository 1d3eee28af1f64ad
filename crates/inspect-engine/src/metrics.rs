//! Metrics collection from the engine and its plugins

use crate::engine::Engine;
use crate::plugin::MetricValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which metric groups a snapshot includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFlags {
    /// Metrics reported by plugins, named `<plugin>.<metric>`
    pub plugins: bool,
    /// Engine counters, named `engine.<counter>`
    pub engine: bool,
}

impl Default for MetricFlags {
    fn default() -> Self {
        Self {
            plugins: true,
            engine: false,
        }
    }
}

/// Takes point-in-time metric snapshots
///
/// The snapshot buffer is reused; every call to [`snapshot`](Self::snapshot)
/// replaces its content.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    flags: MetricFlags,
    snapshot: IndexMap<String, MetricValue>,
}

impl MetricsCollector {
    /// Create a collector following `flags`
    pub fn new(flags: MetricFlags) -> Self {
        Self {
            flags,
            snapshot: IndexMap::new(),
        }
    }

    /// Refresh the snapshot from `engine`
    pub fn snapshot(&mut self, engine: &Engine) {
        self.snapshot.clear();

        if self.flags.engine {
            let counters = engine.counters();
            self.snapshot
                .insert("engine.n_evts".to_string(), MetricValue::U64(counters.n_evts));
            self.snapshot.insert(
                "engine.n_timeouts".to_string(),
                MetricValue::U64(counters.n_timeouts),
            );
            self.snapshot
                .insert("engine.n_drops".to_string(), MetricValue::U64(counters.n_drops));
        }

        if self.flags.plugins {
            for plugin in engine.plugins() {
                for metric in plugin.with_plugin(|p| p.metrics()) {
                    self.snapshot
                        .insert(format!("{}.{}", plugin.name(), metric.name), metric.value);
                }
            }
        }

        debug!("Collected {} metrics", self.snapshot.len());
    }

    /// The last snapshot, in collection order
    pub fn values(&self) -> impl Iterator<Item = (&str, MetricValue)> {
        self.snapshot.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Number of metrics in the last snapshot
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Whether the last snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::plugin::{
        Capabilities, Capability, MetricValue, Plugin, PluginDescriptor, PluginMetric,
    };

    struct Counting;

    impl Plugin for Counting {
        fn metrics(&mut self) -> Vec<PluginMetric> {
            vec![
                PluginMetric::counter("calls", 12),
                PluginMetric::gauge("ratio", MetricValue::Double(0.5)),
            ]
        }
    }

    fn init_counting(_config: &str) -> anyhow::Result<Box<dyn Plugin>> {
        Ok(Box::new(Counting))
    }

    static COUNTING: PluginDescriptor = PluginDescriptor {
        name: "counting",
        version: "0.1.0",
        description: "",
        capabilities: Capabilities::of(Capability::EventParsing),
        event_source: None,
        extract_event_sources: &[],
        fields: &[],
        init: init_counting,
    };

    #[test]
    fn test_empty_engine_has_no_metrics() {
        let engine = Engine::new(EngineOptions::default()).unwrap();
        let mut collector = MetricsCollector::new(MetricFlags::default());
        collector.snapshot(&engine);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_plugin_metrics_are_prefixed() {
        let mut engine = Engine::new(EngineOptions::default()).unwrap();
        engine.register_plugin(&COUNTING, "").unwrap();
        let mut collector = MetricsCollector::new(MetricFlags::default());
        collector.snapshot(&engine);

        let names: Vec<_> = collector.values().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["counting.calls", "counting.ratio"]);
    }

    #[test]
    fn test_engine_counters_and_buffer_reuse() {
        let mut engine = Engine::new(EngineOptions::default()).unwrap();
        engine.register_plugin(&COUNTING, "").unwrap();
        let mut collector = MetricsCollector::new(MetricFlags {
            plugins: false,
            engine: true,
        });
        collector.snapshot(&engine);
        collector.snapshot(&engine);

        assert_eq!(collector.len(), 3);
        let first = collector.values().next().unwrap();
        assert_eq!(first, ("engine.n_evts", MetricValue::U64(0)));
    }
}
