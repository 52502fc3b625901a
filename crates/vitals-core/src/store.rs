//! Metric store: a thread-safe registry of named metrics.
//!
//! - Names are unique across all kinds; metrics are never removed or replaced.
//! - A name may not be a dotted namespace of another name (`foo` vs `foo.bar`),
//!   so every snapshot nests into JSON without ambiguity.
//! - Registrations are serialized by a registration lock; snapshots and
//!   updates never touch it.
//! - A snapshot reads each metric independently. Values are never torn, but
//!   two metrics in one snapshot are not read atomically together.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::error::{Result, VitalsError};
use crate::metric::{relock, Counter, Distribution, DistributionStats, Gauge, Label, Value};
use crate::name;

/// Point-in-time read of every metric, ordered by name.
pub type Snapshot = BTreeMap<String, Value>;

type SampleFn<T> = Arc<dyn Fn() -> T + Send + Sync>;
type NameFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone)]
enum Entry {
    Counter(Counter),
    Gauge(Gauge),
    Label(Label),
    Distribution(Distribution),
    // Computed on read.
    CounterFn(SampleFn<u64>),
    GaugeFn(SampleFn<i64>),
    LabelFn(SampleFn<String>),
    DistributionFn(SampleFn<DistributionStats>),
}

impl Entry {
    fn read(&self) -> Value {
        match self {
            Entry::Counter(c) => Value::Counter(c.read()),
            Entry::Gauge(g) => Value::Gauge(g.read()),
            Entry::Label(l) => Value::Label(l.read()),
            Entry::Distribution(d) => Value::Distribution(d.read()),
            Entry::CounterFn(f) => Value::Counter(f()),
            Entry::GaugeFn(f) => Value::Gauge(f()),
            Entry::LabelFn(f) => Value::Label(f()),
            Entry::DistributionFn(f) => Value::Distribution(f()),
        }
    }
}

#[derive(Default)]
struct StoreInner {
    metrics: DashMap<String, Entry>,
    register_lock: Mutex<()>,
}

/// Shared handle to a metric registry. Cloning is cheap and every clone sees
/// the same metrics.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("metrics", &self.inner.metrics.len())
            .finish()
    }
}

impl Store {
    /// Allocate an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, name: &str, entry: Entry) -> Result<()> {
        name::validate(name)?;

        let _guard = relock(self.inner.register_lock.lock());
        if self.inner.metrics.contains_key(name) {
            tracing::debug!(name = %name, "duplicate metric registration rejected");
            return Err(VitalsError::DuplicateName(name.to_string()));
        }
        let clash = self.inner.metrics.iter().find_map(|e| {
            let existing = e.key();
            (name::is_namespace_of(existing, name) || name::is_namespace_of(name, existing))
                .then(|| existing.clone())
        });
        if let Some(existing) = clash {
            tracing::debug!(name = %name, existing = %existing, "metric namespace clash rejected");
            return Err(VitalsError::PrefixConflict {
                name: name.to_string(),
                existing,
            });
        }

        self.inner.metrics.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn register_counter(&self, name: &str) -> Result<Counter> {
        let c = Counter::new();
        self.insert(name, Entry::Counter(c.clone()))?;
        Ok(c)
    }

    pub fn register_gauge(&self, name: &str) -> Result<Gauge> {
        let g = Gauge::new();
        self.insert(name, Entry::Gauge(g.clone()))?;
        Ok(g)
    }

    pub fn register_label(&self, name: &str) -> Result<Label> {
        let l = Label::new();
        self.insert(name, Entry::Label(l.clone()))?;
        Ok(l)
    }

    pub fn register_distribution(&self, name: &str) -> Result<Distribution> {
        let d = Distribution::new();
        self.insert(name, Entry::Distribution(d.clone()))?;
        Ok(d)
    }

    /// Register a counter whose value is produced by `f` at every read.
    ///
    /// `f` runs on whichever thread takes the snapshot and must not block.
    pub fn register_counter_fn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        self.insert(name, Entry::CounterFn(Arc::new(f)))
    }

    pub fn register_gauge_fn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.insert(name, Entry::GaugeFn(Arc::new(f)))
    }

    pub fn register_label_fn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.insert(name, Entry::LabelFn(Arc::new(f)))
    }

    pub fn register_distribution_fn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn() -> DistributionStats + Send + Sync + 'static,
    {
        self.insert(name, Entry::DistributionFn(Arc::new(f)))
    }

    /// Read every registered metric.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_where(|_| true)
    }

    fn snapshot_where(&self, keep: impl Fn(&str) -> bool) -> Snapshot {
        // Clone entries out first so sampling closures run without shard locks held.
        let entries: Vec<(String, Entry)> = self
            .inner
            .metrics
            .iter()
            .filter(|e| keep(e.key().as_str()))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        entries
            .into_iter()
            .map(|(name, entry)| (name, entry.read()))
            .collect()
    }

    /// Read a single metric.
    pub fn sample(&self, name: &str) -> Option<Value> {
        let entry = self.inner.metrics.get(name)?.value().clone();
        Some(entry.read())
    }

    /// True when `name` is registered, without sampling it.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.metrics.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.metrics.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.metrics.is_empty()
    }

    /// Narrow this store to the names accepted by `filter`.
    pub fn subset<F>(&self, filter: F) -> StoreView
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        StoreView {
            store: self.clone(),
            filter: Arc::new(filter),
        }
    }

    /// Narrow this store to the names under namespace `prefix` (`prefix.*`).
    pub fn prefixed(&self, prefix: &str) -> StoreView {
        let prefix = prefix.to_string();
        self.subset(move |n| name::is_namespace_of(&prefix, n))
    }
}

/// Capability-narrowed view over a [`Store`].
///
/// Hand this to a library instead of the whole store: it can only register
/// and read names accepted by the filter. It is a wrapper, not a copy;
/// everything registered through it lands in the underlying store.
#[derive(Clone)]
pub struct StoreView {
    store: Store,
    filter: NameFilter,
}

impl fmt::Debug for StoreView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreView").field("store", &self.store).finish()
    }
}

impl StoreView {
    fn admit(&self, name: &str) -> Result<()> {
        if (self.filter)(name) {
            Ok(())
        } else {
            Err(VitalsError::OutsideView(name.to_string()))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        (self.filter)(name)
    }

    pub fn register_counter(&self, name: &str) -> Result<Counter> {
        self.admit(name)?;
        self.store.register_counter(name)
    }

    pub fn register_gauge(&self, name: &str) -> Result<Gauge> {
        self.admit(name)?;
        self.store.register_gauge(name)
    }

    pub fn register_label(&self, name: &str) -> Result<Label> {
        self.admit(name)?;
        self.store.register_label(name)
    }

    pub fn register_distribution(&self, name: &str) -> Result<Distribution> {
        self.admit(name)?;
        self.store.register_distribution(name)
    }

    pub fn register_counter_fn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        self.admit(name)?;
        self.store.register_counter_fn(name, f)
    }

    pub fn register_gauge_fn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.admit(name)?;
        self.store.register_gauge_fn(name, f)
    }

    pub fn register_label_fn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.admit(name)?;
        self.store.register_label_fn(name, f)
    }

    /// Read the metrics visible through this view.
    pub fn snapshot(&self) -> Snapshot {
        let filter = Arc::clone(&self.filter);
        self.store.snapshot_where(move |n| filter(n))
    }

    pub fn sample(&self, name: &str) -> Option<Value> {
        if !self.contains(name) {
            return None;
        }
        self.store.sample(name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn sampled_metrics_are_read_each_time() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let store = Store::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let t = Arc::clone(&ticks);
        store
            .register_counter_fn("ticks", move || t.fetch_add(1, Ordering::Relaxed) + 1)
            .unwrap();

        assert_eq!(store.sample("ticks"), Some(Value::Counter(1)));
        assert_eq!(store.snapshot()["ticks"], Value::Counter(2));
        assert_eq!(ticks.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn sampling_closure_may_use_the_store() {
        let store = Store::new();
        let inner = store.clone();
        store
            .register_gauge_fn("meta.count", move || inner.len() as i64)
            .unwrap();
        store.register_counter("x").unwrap();
        assert_eq!(store.snapshot()["meta.count"], Value::Gauge(2));
    }

    #[test]
    fn contains_does_not_run_sampling_closures() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let store = Store::new();
        let sampled = Arc::new(AtomicBool::new(false));
        let s = Arc::clone(&sampled);
        store
            .register_label_fn("build", move || {
                s.store(true, Ordering::Relaxed);
                "x".into()
            })
            .unwrap();

        assert!(store.contains("build"));
        assert!(!store.contains("missing"));
        assert!(!sampled.load(Ordering::Relaxed));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let store = Store::new();
        let err = store.register_counter("a..b").unwrap_err();
        assert_eq!(err, VitalsError::InvalidName("a..b".into()));
        assert!(store.is_empty());
    }
}
