//! Named numeric metrics attached to a property.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of a [`Telemetry`] attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub metrics: BTreeMap<String, f64>,
    pub last_updated: DateTime<Utc>,
}

/// Metrics store.
pub struct Telemetry {
    state: RwLock<TelemetrySnapshot>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TelemetrySnapshot {
                metrics: BTreeMap::new(),
                last_updated: Utc::now(),
            }),
        }
    }

    /// Merge the given metrics into the store.
    pub fn update_metrics<I, K>(&self, metrics: I)
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut state = self.state.write();
        for (name, value) in metrics {
            state.metrics.insert(name.into(), value);
        }
        state.last_updated = Utc::now();
    }

    /// Add one to a counter and return its new value.
    pub fn increment(&self, name: &str) -> f64 {
        let mut state = self.state.write();
        let counter = state.metrics.entry(name.to_string()).or_insert(0.0);
        *counter += 1.0;
        let value = *counter;
        state.last_updated = Utc::now();
        value
    }

    pub fn get_metric(&self, name: &str) -> Option<f64> {
        self.state.read().metrics.get(name).copied()
    }

    pub fn get_metrics(&self) -> BTreeMap<String, f64> {
        self.state.read().metrics.clone()
    }

    pub fn reset_metrics(&self) {
        let mut state = self.state.write();
        state.metrics.clear();
        state.last_updated = Utc::now();
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.state.read().last_updated
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.state.read().clone()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_get() {
        let telemetry = Telemetry::new();
        telemetry.update_metrics([("latency_ms", 12.5), ("queue_depth", 3.0)]);

        assert_eq!(telemetry.get_metric("latency_ms"), Some(12.5));
        assert_eq!(telemetry.get_metrics().len(), 2);
        assert_eq!(telemetry.get_metric("missing"), None);
    }

    #[test]
    fn test_increment() {
        let telemetry = Telemetry::new();
        assert_eq!(telemetry.increment("sets_total"), 1.0);
        assert_eq!(telemetry.increment("sets_total"), 2.0);
    }

    #[test]
    fn test_reset_bumps_timestamp() {
        let telemetry = Telemetry::new();
        telemetry.increment("x");
        let before = telemetry.last_updated();

        telemetry.reset_metrics();
        assert!(telemetry.get_metrics().is_empty());
        assert!(telemetry.last_updated() >= before);
    }

    #[test]
    fn test_snapshot_serializes() {
        let telemetry = Telemetry::new();
        telemetry.increment("sets_total");
        let json = serde_json::to_string(&telemetry.snapshot()).unwrap();
        assert!(json.contains("sets_total"));
        assert!(json.contains("last_updated"));
    }
}
