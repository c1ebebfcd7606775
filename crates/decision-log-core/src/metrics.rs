//! Timers and counters collected during evaluation.
//!
//! The evaluation engine owns a `Metrics` bag and shares it with decision
//! records through an `Arc`; records serialize a snapshot at log time.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};

/// Shared bag of evaluation timers and counters.
#[derive(Debug, Default)]
pub struct Metrics {
    timers: RwLock<BTreeMap<String, u64>>,
    counters: RwLock<BTreeMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed` to the named timer.
    pub fn record_timer(&self, name: &str, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        let mut timers = self.timers.write();
        let total = timers.entry(name.to_string()).or_insert(0);
        *total = total.saturating_add(nanos);
    }

    /// Increment the named counter by one.
    pub fn incr_counter(&self, name: &str) {
        self.add_counter(name, 1);
    }

    /// Increment the named counter by `n`.
    pub fn add_counter(&self, name: &str, n: u64) {
        let mut counters = self.counters.write();
        let total = counters.entry(name.to_string()).or_insert(0);
        *total = total.saturating_add(n);
    }

    /// Current value of a timer, in nanoseconds.
    pub fn timer_ns(&self, name: &str) -> Option<u64> {
        self.timers.read().get(name).copied()
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.read().get(name).copied()
    }

    /// Flat snapshot keyed `timer_<name>_ns` and `counter_<name>`.
    pub fn all(&self) -> BTreeMap<String, u64> {
        let mut snapshot = BTreeMap::new();
        for (name, nanos) in self.timers.read().iter() {
            snapshot.insert(format!("timer_{name}_ns"), *nanos);
        }
        for (name, count) in self.counters.read().iter() {
            snapshot.insert(format!("counter_{name}"), *count);
        }
        snapshot
    }

    /// True when no timer or counter has been recorded.
    pub fn is_empty(&self) -> bool {
        self.timers.read().is_empty() && self.counters.read().is_empty()
    }

    pub fn clear(&self) {
        self.timers.write().clear();
        self.counters.write().clear();
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.all().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_keys() {
        let metrics = Metrics::new();
        metrics.record_timer("rego_query_eval", Duration::from_micros(3));
        metrics.record_timer("rego_query_eval", Duration::from_micros(2));
        metrics.incr_counter("server_query_cache_hit");

        assert_eq!(metrics.timer_ns("rego_query_eval"), Some(5_000));
        assert_eq!(
            serde_json::to_value(&metrics).unwrap(),
            json!({
                "counter_server_query_cache_hit": 1,
                "timer_rego_query_eval_ns": 5000
            })
        );
    }

    #[test]
    fn test_clear() {
        let metrics = Metrics::new();
        metrics.add_counter("evals", 4);
        assert_eq!(metrics.counter("evals"), Some(4));
        metrics.clear();
        assert!(metrics.all().is_empty());
        assert!(metrics.is_empty());
    }
}
