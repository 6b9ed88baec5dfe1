//! Configuration for the tempdrop server.
//!
//! Settings are layered, later sources winning:
//!
//! 1. Built-in defaults (see [`crate::constants`])
//! 2. An optional TOML file (`--config tempdrop.toml`)
//! 3. Environment variables (`TEMPDROP_DIR`, `MAX_FILE_SIZE_MB`,
//!    `MAX_TOTAL_FILES`, `CLEANUP_TIMER_MIN`, `SITE_URL`, `TEMPDROP_KEY`)
//! 4. Command-line flags
//!
//! Numeric environment values that are missing, unparseable or not
//! positive fall back to the defaults instead of failing startup.
//!
//! ```toml
//! storage_dir = "/var/tempdrop"
//! port = 8080
//! max_file_size_mb = 512
//! max_total_files = 100
//! cleanup_interval_min = 5
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::constants;
use crate::store::StoreConfig;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding uploaded files
    pub storage_dir: PathBuf,
    /// HTTP listen port
    pub port: u16,
    /// Public URL, informational
    pub site_url: String,
    /// Upload ceiling in megabytes
    pub max_file_size_mb: u64,
    /// Ceiling on files held at once
    pub max_total_files: u64,
    /// Minutes between reaper sweeps
    pub cleanup_interval_min: u64,
    /// Upload key; generated at startup when unset
    pub access_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(constants::DEFAULT_STORAGE_DIR),
            port: constants::DEFAULT_PORT,
            site_url: constants::DEFAULT_SITE_URL.to_string(),
            max_file_size_mb: constants::DEFAULT_MAX_FILE_SIZE_MB,
            max_total_files: constants::DEFAULT_MAX_TOTAL_FILES,
            cleanup_interval_min: constants::DEFAULT_CLEANUP_INTERVAL_MIN,
            access_key: None,
        }
    }
}

/// Parses a strictly positive integer, or `None`.
fn positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|&n| n > 0)
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or names unknown settings.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` if given, else start from defaults, then apply the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file was given and cannot be loaded.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay settings from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(constants::ENV_STORAGE_DIR).filter(|d| !d.is_empty()) {
            self.storage_dir = PathBuf::from(dir);
        }

        let numeric = |name: &str, default: u64| -> Option<u64> {
            let raw = lookup(name)?;
            let value = positive(&raw);
            if value.is_none() {
                warn!(
                    variable = name,
                    value = %raw,
                    default,
                    "Ignoring invalid setting, using default"
                );
            }
            Some(value.unwrap_or(default))
        };

        if let Some(mb) = numeric(
            constants::ENV_MAX_FILE_SIZE_MB,
            constants::DEFAULT_MAX_FILE_SIZE_MB,
        ) {
            self.max_file_size_mb = mb;
        }
        if let Some(count) = numeric(
            constants::ENV_MAX_TOTAL_FILES,
            constants::DEFAULT_MAX_TOTAL_FILES,
        ) {
            self.max_total_files = count;
        }
        if let Some(minutes) = numeric(
            constants::ENV_CLEANUP_TIMER_MIN,
            constants::DEFAULT_CLEANUP_INTERVAL_MIN,
        ) {
            self.cleanup_interval_min = minutes;
        }

        if let Some(url) = lookup(constants::ENV_SITE_URL).filter(|u| !u.is_empty()) {
            self.site_url = url;
        }
        if let Some(key) = lookup(constants::ENV_ACCESS_KEY).filter(|k| !k.is_empty()) {
            self.access_key = Some(key);
        }
    }

    /// Upload ceiling in bytes.
    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(constants::BYTES_PER_MB)
    }

    /// Interval between reaper sweeps.
    #[must_use]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_min.saturating_mul(60))
    }

    /// Limits for the object store.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.storage_dir)
            .with_max_file_size_bytes(self.max_file_size_bytes())
            .with_max_total_files(self.max_total_files)
    }

    /// Validate configuration with comprehensive checks.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error listing every fatal problem:
    /// - Port 0
    /// - Empty storage directory
    /// - Zero size, file-count or interval limits
    /// - Empty access key
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.port == 0 {
            errors.push("port cannot be 0. Use a valid port number (1-65535)".to_string());
        } else if self.port < 1024 {
            warnings.push(format!(
                "Port {} is a system/privileged port (< 1024)\n  \
                 Recommendation: Use ports >= 1024 (e.g., 8080) to avoid permission issues",
                self.port
            ));
        }

        if self.storage_dir.as_os_str().is_empty() {
            errors.push("storage_dir cannot be empty".to_string());
        } else if self.storage_dir.exists() && !self.storage_dir.is_dir() {
            errors.push(format!(
                "storage_dir is not a directory: {}",
                self.storage_dir.display()
            ));
        }

        if self.max_file_size_mb == 0 {
            errors.push("max_file_size_mb cannot be 0".to_string());
        }
        if self.max_total_files == 0 {
            errors.push("max_total_files cannot be 0".to_string());
        }
        if self.cleanup_interval_min == 0 {
            errors.push("cleanup_interval_min cannot be 0".to_string());
        }

        match self.access_key.as_deref() {
            Some("") => errors.push("access_key cannot be empty".to_string()),
            Some(key) if key.len() < 2 * constants::ACCESS_KEY_BYTES => warnings.push(format!(
                "access_key is short ({} chars)\n  \
                 Recommendation: Use at least {} characters or leave it unset to generate one",
                key.len(),
                2 * constants::ACCESS_KEY_BYTES
            )),
            _ => {},
        }

        if !self.site_url.starts_with("http://") && !self.site_url.starts_with("https://") {
            warnings.push(format!(
                "site_url {:?} does not start with http:// or https://",
                self.site_url
            ));
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}
