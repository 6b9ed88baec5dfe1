//! Defaults and fixed names shared across the crate.

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default storage directory.
pub const DEFAULT_STORAGE_DIR: &str = "/var/tempdrop";

/// Default public URL, only used in startup logs.
pub const DEFAULT_SITE_URL: &str = "http://localhost";

/// Default upload ceiling in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 1024;

/// Default ceiling on stored files.
pub const DEFAULT_MAX_TOTAL_FILES: u64 = 24;

/// Default minutes between reaper sweeps.
pub const DEFAULT_CLEANUP_INTERVAL_MIN: u64 = 10;

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Header carrying the upload access key.
pub const ACCESS_KEY_HEADER: &str = "x-tempdrop-key";

/// Random bytes in a generated access key (rendered as twice as many hex chars).
pub const ACCESS_KEY_BYTES: usize = 16;

// Environment variables
pub const ENV_STORAGE_DIR: &str = "TEMPDROP_DIR";
pub const ENV_MAX_FILE_SIZE_MB: &str = "MAX_FILE_SIZE_MB";
pub const ENV_MAX_TOTAL_FILES: &str = "MAX_TOTAL_FILES";
pub const ENV_CLEANUP_TIMER_MIN: &str = "CLEANUP_TIMER_MIN";
pub const ENV_SITE_URL: &str = "SITE_URL";
pub const ENV_ACCESS_KEY: &str = "TEMPDROP_KEY";
