use serde::Deserialize;
use vitals_core::error::{Result, VitalsError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitalsConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl VitalsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VitalsError::UnsupportedVersion);
        }
        self.server.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// `null` binds every interface. Anything but loopback exposes the
    /// metrics to the network; that is the operator's call.
    #[serde(default = "default_host")]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err(VitalsError::BadRequest(
                    "server.host must not be empty (use null for all interfaces)".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_host() -> Option<String> {
    Some("localhost".into())
}
fn default_port() -> u16 {
    8000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Register the predefined `rts.*` process metrics.
    #[serde(default = "default_runtime")]
    pub runtime: bool,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
        }
    }
}

fn default_runtime() -> bool {
    true
}
