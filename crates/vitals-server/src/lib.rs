//! vitals server library entry.
//!
//! This crate puts a [`vitals_core::Store`] behind HTTP: the axum router and
//! handlers, the background server thread and its supervision, and the
//! predefined process metrics. It is consumed by the demo binary
//! (`main.rs`), by embedding applications, and by integration tests.

pub mod app_state;
pub mod config;
pub mod dashboard;
pub mod lifecycle;
pub mod obs;
pub mod ops;
pub mod router;

pub use lifecycle::{
    fork_server, fork_server_no_hostname, fork_server_no_hostname_with, fork_server_with,
    ServerHandle, ServerState, SERVER_TIMESTAMP_METRIC,
};
