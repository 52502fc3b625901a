//! vitals server configuration: where to listen and which predefined
//! metrics to register. YAML, parsed strictly (unknown keys are errors)
//! and validated before use.

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use vitals_core::error::{Result, VitalsError};

pub use schema::{MetricsSection, ServerSection, VitalsConfig};

/// Default config file, relative to the working directory.
pub const DEFAULT_PATH: &str = "vitals.yaml";

pub fn load_from_file(path: &str) -> Result<VitalsConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| VitalsError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
/// A file that exists and fails to parse is still an error.
pub fn load_or_default(path: &str) -> Result<VitalsConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path, "no config file, using defaults");
            Ok(VitalsConfig::default())
        }
        Err(e) => Err(VitalsError::Internal(format!("read config {path} failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<VitalsConfig> {
    let cfg: VitalsConfig = serde_yaml::from_str(s)
        .map_err(|e| VitalsError::BadRequest(format!("invalid config yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
