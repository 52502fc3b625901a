use std::sync::{Arc, Mutex};

use super::relock;

/// Summary of a sample stream as exposed in snapshots.
///
/// `variance` is the population variance. An empty distribution reports zero
/// for every field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistributionStats {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    count: u64,
    sum: f64,
    mean: f64,
    // Sum of squared deviations from the running mean (Welford's M2).
    m2: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn push(&mut self, x: f64, n: u64) {
        if n == 0 {
            return;
        }
        if self.count == 0 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }

        let old_count = self.count as f64;
        let weight = n as f64;
        let new_count = old_count + weight;
        let delta = x - self.mean;

        self.mean += delta * weight / new_count;
        self.m2 += delta * delta * old_count * weight / new_count;
        self.sum += x * weight;
        self.count += n;
    }

    fn stats(&self) -> DistributionStats {
        if self.count == 0 {
            return DistributionStats::default();
        }
        DistributionStats {
            count: self.count,
            sum: self.sum,
            mean: self.mean,
            variance: self.m2 / self.count as f64,
            min: self.min,
            max: self.max,
        }
    }
}

/// Online statistical summary (count, sum, mean, variance, min, max).
///
/// Samples are folded in as they arrive; none are retained.
#[derive(Debug, Clone, Default)]
pub struct Distribution {
    acc: Arc<Mutex<Accumulator>>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation.
    pub fn add(&self, x: f64) {
        self.add_n(x, 1);
    }

    /// Record the same observation `n` times.
    pub fn add_n(&self, x: f64, n: u64) {
        relock(self.acc.lock()).push(x, n);
    }

    pub fn read(&self) -> DistributionStats {
        relock(self.acc.lock()).stats()
    }
}
