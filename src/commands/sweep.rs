//! One-off expiration sweep.
//!
//! Runs the same sweep the server's reaper runs, once, and prints what it
//! did. Handy from cron when the server is not running.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::Config;
use crate::reaper::sweep_async;

/// Sweep the configured storage directory once.
///
/// # Errors
///
/// Returns an error if the storage directory cannot be listed.
pub async fn execute(config: Config) -> Result<()> {
    let dir = config.storage_dir.clone();
    let report = sweep_async(dir.clone(), Utc::now())
        .await
        .with_context(|| format!("Failed to sweep {}", dir.display()))?;

    println!(
        "Swept {}: {} removed, {} kept, {} ignored, {} failed",
        dir.display(),
        report.removed,
        report.retained,
        report.skipped,
        report.failed
    );

    Ok(())
}
