//! CLI command implementations for tempdrop.
//!
//! - [`serve`] - HTTP server with the background reaper
//! - [`sweep`] - One-off expiration sweep

pub mod serve;
pub mod sweep;

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;

/// Resolve the effective configuration and apply CLI overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the result
/// fails validation.
pub fn load_config(
    config_path: Option<&PathBuf>,
    dir_override: Option<PathBuf>,
    port_override: Option<u16>,
) -> Result<Config> {
    let mut config = Config::resolve(config_path.map(PathBuf::as_path))?;
    if let Some(dir) = dir_override {
        config.storage_dir = dir;
    }
    if let Some(port) = port_override {
        config.port = port;
    }

    let validation = config.validate()?;
    for warning in &validation.warnings {
        tracing::warn!("{warning}");
    }

    Ok(config)
}
