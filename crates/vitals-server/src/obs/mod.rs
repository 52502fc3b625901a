//! Predefined process metrics.
//!
//! Registered by the `fork_server` / `fork_server_no_hostname` conveniences
//! under the `rts.` namespace. Embedders sharing a store across libraries
//! use the `_with` variants and call [`runtime::register`] at most once.

pub mod runtime;
