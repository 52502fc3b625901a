//! HTTP endpoints.
//!
//! - `GET /`           : whole store; HTML unless the client accepts JSON
//! - `GET /a/b/c`      : metric `a.b.c`, or the subtree of namespace `a.b.c`
//! - `?v=1`            : pin the document version (1 is the only and latest)
//!
//! Errors are JSON `{"code": ..., "msg": ...}` with a matching status.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use vitals_core::encode::{encode_sample, encode_subtree, encode_value, API_VERSION};
use vitals_core::error::{ClientCode, VitalsError};
use vitals_core::name;

use crate::app_state::AppState;
use crate::dashboard;

#[derive(Debug, Default, Deserialize)]
pub struct VersionQuery {
    pub v: Option<u32>,
}

impl VersionQuery {
    fn check(&self) -> Result<(), VitalsError> {
        match self.v {
            None => Ok(()),
            Some(v) if v == API_VERSION => Ok(()),
            Some(_) => Err(VitalsError::UnsupportedVersion),
        }
    }
}

/// Error wrapper so handlers can `?` on core results.
#[derive(Debug)]
pub struct ApiError(pub VitalsError);

impl From<VitalsError> for ApiError {
    fn from(e: VitalsError) -> Self {
        Self(e)
    }
}

fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::Conflict => StatusCode::CONFLICT,
        ClientCode::NotAllowed => StatusCode::FORBIDDEN,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        if code == ClientCode::Internal {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = json!({ "code": code.as_str(), "msg": self.0.to_string() });
        (status_for(code), Json(body)).into_response()
    }
}

/// True when some Accept media range is `application/json` with a non-zero
/// quality. Wildcards select the dashboard.
fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(media_range_is_json)
}

fn media_range_is_json(range: &str) -> bool {
    let mut parts = range.split(';').map(str::trim);
    let is_json = parts
        .next()
        .is_some_and(|m| m.eq_ignore_ascii_case("application/json"));
    if !is_json {
        return false;
    }
    // q=0 means "not acceptable"; a malformed q counts as 1.
    let q = parts
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, v)| v.trim().parse::<f32>().ok())
        .unwrap_or(1.0);
    q > 0.0
}

pub async fn root(
    State(state): State<AppState>,
    Query(q): Query<VersionQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    q.check()?;
    let sample = state.store().snapshot();

    if accepts_json(&headers) {
        let doc = encode_sample(&sample)?;
        Ok(Json(doc).into_response())
    } else {
        Ok(Html(dashboard::render(&sample)).into_response())
    }
}

pub async fn metric(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(q): Query<VersionQuery>,
) -> Result<Response, ApiError> {
    q.check()?;
    let name = name::from_path(&path)?;
    let store = state.store();

    if let Some(value) = store.sample(&name) {
        return Ok(Json(encode_value(&value)).into_response());
    }
    match encode_subtree(&store.snapshot(), &name)? {
        Some(doc) => Ok(Json(doc).into_response()),
        None => Err(VitalsError::NotFound(name).into()),
    }
}
