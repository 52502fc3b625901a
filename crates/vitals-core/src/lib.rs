//! vitals core: metric value types, the metric store, and the JSON encoder.
//!
//! This crate owns metric identity (names, kinds, uniqueness) and the
//! snapshot format shared by the HTTP front end and embedding applications.
//! It intentionally carries no transport or runtime dependencies so a library
//! can register metrics without pulling in a server.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `VitalsError`/`Result` so a monitoring
//! library never takes the host process down on a bad registration.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod encode;
pub mod error;
pub mod metric;
pub mod name;
pub mod store;

/// Shared result type.
pub use error::{Result, VitalsError};
pub use metric::{Counter, Distribution, DistributionStats, Gauge, Label, Value};
pub use store::{Snapshot, Store, StoreView};
