//! Metric name rules.
//!
//! Names are dot-separated segments (`http.requests.total`). Segments only
//! matter for presentation: JSON nesting and the `/http/requests/total` URL.

use crate::error::{Result, VitalsError};

/// Separator between namespace segments.
pub const SEPARATOR: char = '.';

/// Reject empty names and empty segments (`""`, `"a..b"`, `".a"`, `"a."`).
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() || name.split(SEPARATOR).any(str::is_empty) {
        return Err(VitalsError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Iterate the segments of a name.
pub fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split(SEPARATOR)
}

/// True when `ns` is a strict dotted prefix of `name` (`a.b` of `a.b.c`, not of `a.bc`).
pub fn is_namespace_of(ns: &str, name: &str) -> bool {
    name.len() > ns.len()
        && name.starts_with(ns)
        && name[ns.len()..].starts_with(SEPARATOR)
}

/// Map URL path segments (`/foo/bar`) to a metric name (`foo.bar`).
pub fn from_path(path: &str) -> Result<String> {
    let name = path
        .trim_matches('/')
        .split('/')
        .collect::<Vec<_>>()
        .join(".");
    validate(&name)?;
    Ok(name)
}
