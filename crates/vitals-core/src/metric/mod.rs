//! Metric value types.
//!
//! Every kind is a cheap `Clone` handle around shared state, so the handle
//! returned by registration and the entry held by the store observe the same
//! value. Counters and gauges are single atomics; labels and distributions
//! carry multi-field state and use a short-held lock.

pub mod counter;
pub mod distribution;
pub mod gauge;
pub mod label;

pub use counter::Counter;
pub use distribution::{Distribution, DistributionStats};
pub use gauge::Gauge;
pub use label::Label;

/// Metric kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Counter,
    Gauge,
    Label,
    Distribution,
}

impl Kind {
    /// Single-letter tag used in the JSON `type` field.
    pub fn tag(self) -> &'static str {
        match self {
            Kind::Counter => "c",
            Kind::Gauge => "g",
            Kind::Label => "l",
            Kind::Distribution => "d",
        }
    }
}

/// A point-in-time read of one metric.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Counter(u64),
    Gauge(i64),
    Label(String),
    Distribution(DistributionStats),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Counter(_) => Kind::Counter,
            Value::Gauge(_) => Kind::Gauge,
            Value::Label(_) => Kind::Label,
            Value::Distribution(_) => Kind::Distribution,
        }
    }
}

/// Recover the guard from a poisoned lock. Metric state stays valid after a
/// panicking writer since every update is applied in a single step.
pub(crate) fn relock<T>(r: std::sync::LockResult<T>) -> T {
    r.unwrap_or_else(std::sync::PoisonError::into_inner)
}
