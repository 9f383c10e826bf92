pub mod schema;

pub use schema::{ProcessConfig, SamplerConfig, SourceConfig};

use ptop_core::{Result, SampleError};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `SamplerConfig::default()`
/// if the file doesn't exist so the dashboard always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<SamplerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(SamplerConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| SampleError::Config(format!("cannot read '{}': {e}", path.display())))?;

    toml::from_str(&raw).map_err(|e| SampleError::Config(format!("TOML parse error: {e}")))
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("ptop").join("ptop.toml")
}
