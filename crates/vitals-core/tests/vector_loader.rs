//! JSON test vector loader for encoder tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde::Deserialize;

use vitals_core::Store;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    pub metrics: Vec<MetricEntry>,
    pub expect: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetricEntry {
    Counter { name: String, #[serde(default)] add: u64 },
    Gauge { name: String, #[serde(default)] set: i64 },
    Label { name: String, #[serde(default)] set: String },
    Distribution { name: String, #[serde(default)] samples: Vec<f64> },
}

impl TestVector {
    /// Register and update every metric in a fresh store.
    pub fn build_store(&self) -> Store {
        let store = Store::new();
        for m in &self.metrics {
            match m {
                MetricEntry::Counter { name, add } => store.register_counter(name).unwrap().add(*add),
                MetricEntry::Gauge { name, set } => store.register_gauge(name).unwrap().set(*set),
                MetricEntry::Label { name, set } => store.register_label(name).unwrap().set(set.as_str()),
                MetricEntry::Distribution { name, samples } => {
                    let d = store.register_distribution(name).unwrap();
                    for x in samples {
                        d.add(*x);
                    }
                }
            }
        }
        store
    }
}
