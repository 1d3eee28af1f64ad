//! Metric records handed to tests

use inspect_engine::MetricsCollector;
use serde::Serialize;

/// A point-in-time metric value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    /// Metric name, `<plugin>.<metric>` or `engine.<counter>`
    pub name: String,
    /// Value converted to `u64`
    pub value: u64,
}

/// Copy the collector's last snapshot into owned records
pub(crate) fn copy_snapshot(collector: &MetricsCollector) -> Vec<Metric> {
    collector
        .values()
        .map(|(name, value)| Metric {
            name: name.to_string(),
            value: value.as_u64(),
        })
        .collect()
}
