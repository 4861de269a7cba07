//! YAML config file loader.

use std::path::Path;

use anyhow::Result;

use crate::domain::config::ProvisionConfig;
use crate::domain::error::ProvisionError;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "HAB_PROVISION_CONFIG";

/// Read and parse the provisioning config at `path`.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] if the file cannot be read or is
/// not a valid config document (including unknown keys).
pub fn load_config(path: &Path) -> Result<ProvisionConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ProvisionError::Configuration(format!("cannot read {}: {e}", path.display()))
    })?;
    let config = serde_yaml::from_str(&content).map_err(|e| {
        ProvisionError::Configuration(format!("cannot parse {}: {e}", path.display()))
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
