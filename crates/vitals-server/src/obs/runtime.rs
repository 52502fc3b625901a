//! `rts.*` process statistics, all computed on read.
//!
//! - `rts.start_time_ms`  counter, wall clock at registration
//! - `rts.uptime_ms`      counter, time since registration
//! - `rts.threads`        gauge, OS threads in this process (Linux)
//! - `rts.rss_bytes`      gauge, resident set size (Linux)
//!
//! The last two come from `/proc/self/status`. On other platforms they are
//! not registered and a warning is logged at registration time.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use vitals_core::{Result, Store};

/// Namespace owned by this module.
pub const NAMESPACE: &str = "rts";

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Register the predefined metrics into `store`.
///
/// Fails with `DuplicateName` if any `rts.*` name is already taken.
pub fn register(store: &Store) -> Result<()> {
    let view = store.prefixed(NAMESPACE);

    let start_ms = unix_millis();
    let started = Instant::now();
    view.register_counter_fn("rts.start_time_ms", move || start_ms)?;
    view.register_counter_fn("rts.uptime_ms", move || started.elapsed().as_millis() as u64)?;

    if cfg!(target_os = "linux") {
        view.register_gauge_fn("rts.threads", || {
            proc_status_field("Threads:").unwrap_or(0)
        })?;
        view.register_gauge_fn("rts.rss_bytes", || {
            proc_status_field("VmRSS:").map(|kb| kb * 1024).unwrap_or(0)
        })?;
    } else {
        tracing::warn!(
            "process statistics unavailable on this platform; rts.threads and rts.rss_bytes not registered"
        );
    }
    Ok(())
}

fn proc_status_field(field: &str) -> Option<i64> {
    let text = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_status_field(&text, field)
}

/// Pull the leading integer after `field` (`"VmRSS:   1234 kB"` -> 1234).
fn parse_status_field(text: &str, field: &str) -> Option<i64> {
    text.lines()
        .find_map(|line| line.strip_prefix(field))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
}
