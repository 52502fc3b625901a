//! Axum router wiring.
//!
//! - `/`       : full snapshot (HTML, or JSON with `Accept: application/json`)
//! - `/*path`  : one metric or namespace, JSON only

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::root))
        .route("/*path", get(ops::metric))
        .with_state(state)
}
