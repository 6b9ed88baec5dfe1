//! Expiration reaper.
//!
//! Periodically scans the storage directory and deletes every file whose
//! storage key says it has expired. Files that do not decode as storage
//! keys are left alone, so unrelated files can live in the same directory.
//!
//! A sweep never fails part-way: a file that cannot be deleted is logged
//! and skipped. Only a failure to list the directory aborts a sweep, and
//! even then the schedule keeps running.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::store::{StoreError, decode_key};

/// Shortest interval the reaper will tick at.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Non-directory entries looked at
    pub scanned: usize,
    /// Expired files deleted
    pub removed: usize,
    /// Storage keys that have not expired yet
    pub retained: usize,
    /// Entries that are not storage keys
    pub skipped: usize,
    /// Expired files whose deletion failed
    pub failed: usize,
}

/// Runs one sweep over `dir`, treating `now` as the current time.
///
/// # Errors
///
/// Returns [`StoreError::DirectoryUnreadable`] only if the directory itself
/// cannot be listed. Per-entry problems are logged and counted instead.
pub fn sweep(dir: &Path, now: DateTime<Utc>) -> Result<SweepReport, StoreError> {
    sweep_with(dir, now, |path| fs::remove_file(path))
}

/// [`sweep`] with a pluggable delete step.
pub(crate) fn sweep_with<F>(
    dir: &Path,
    now: DateTime<Utc>,
    mut remove: F,
) -> Result<SweepReport, StoreError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let entries = fs::read_dir(dir).map_err(|e| StoreError::unreadable(dir, e))?;
    let mut report = SweepReport::default();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                report.failed += 1;
                continue;
            },
        };

        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => continue,
            Ok(_) => {},
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to stat entry");
                report.failed += 1;
                continue;
            },
        }
        report.scanned += 1;

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!(path = %entry.path().display(), "Skipping non UTF-8 filename");
            report.skipped += 1;
            continue;
        };

        let key = match decode_key(name) {
            Ok(key) => key,
            Err(reason) => {
                debug!(file = %name, %reason, "Skipping file that is not a storage key");
                report.skipped += 1;
                continue;
            },
        };

        if !key.is_expired_at(now) {
            report.retained += 1;
            continue;
        }

        let path = entry.path();
        match remove(&path) {
            Ok(()) => {
                let expired = key
                    .expires_at_utc()
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_default();
                info!(path = %path.display(), expired_at = %expired, "Removed expired file");
                report.removed += 1;
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove expired file");
                report.failed += 1;
            },
        }
    }

    Ok(report)
}

/// Async version of [`sweep`], run on the blocking pool.
///
/// # Errors
///
/// Same as [`sweep`], plus [`StoreError::Task`] if the blocking task dies.
pub async fn sweep_async(dir: PathBuf, now: DateTime<Utc>) -> Result<SweepReport, StoreError> {
    tokio::task::spawn_blocking(move || sweep(&dir, now)).await?
}

/// Background task that sweeps a directory on a fixed interval.
///
/// The first sweep happens as soon as the task starts.
#[derive(Debug, Clone)]
pub struct Reaper {
    dir: PathBuf,
    interval: Duration,
}

impl Reaper {
    pub fn new(dir: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Runs a single sweep at the current time, logging instead of failing.
    ///
    /// Returns `None` when the sweep could not run.
    pub async fn sweep_once(&self) -> Option<SweepReport> {
        match sweep_async(self.dir.clone(), Utc::now()).await {
            Ok(report) => {
                info!(
                    scanned = report.scanned,
                    removed = report.removed,
                    retained = report.retained,
                    skipped = report.skipped,
                    failed = report.failed,
                    "Sweep finished"
                );
                Some(report)
            },
            Err(e) => {
                error!(dir = %self.dir.display(), error = %e, "Error cleaning expired files");
                None
            },
        }
    }

    /// Sweeps forever. Errors in one sweep never stop the next one.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            dir = %self.dir.display(),
            interval = ?self.interval,
            "Reaper started"
        );

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// Spawns [`Reaper::run`] onto the tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{encode_key, generate_id};
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"data").unwrap();
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let tmp = TempDir::new().unwrap();
        let now = at(1_700_000_000);

        let expired: Vec<String> = (0..3)
            .map(|i| encode_key(generate_id(), 1_699_999_000 + i))
            .collect();
        let live: Vec<String> = (0..2)
            .map(|i| encode_key(generate_id(), 1_700_000_000 + i))
            .collect();
        for name in expired.iter().chain(&live) {
            touch(tmp.path(), name);
        }

        let report = sweep(tmp.path(), now).unwrap();
        assert_eq!(
            report,
            SweepReport {
                scanned: 5,
                removed: 3,
                retained: 2,
                skipped: 0,
                failed: 0,
            }
        );

        for name in &expired {
            assert!(!tmp.path().join(name).exists());
        }
        for name in &live {
            assert!(tmp.path().join(name).exists());
        }
    }

    #[test]
    fn test_sweep_keeps_file_expiring_exactly_now() {
        let tmp = TempDir::new().unwrap();
        let name = encode_key(generate_id(), 1_700_000_000);
        touch(tmp.path(), &name);

        let report = sweep(tmp.path(), at(1_700_000_000)).unwrap();
        assert_eq!(report.removed, 0);
        assert!(tmp.path().join(&name).exists());
    }

    #[test]
    fn test_sweep_ignores_foreign_files() {
        let tmp = TempDir::new().unwrap();
        let foreign = [
            "README.md",
            "notes-1",
            "a-b-c-1",
            "0190b6c4-5e2a-4c3d-9f41-2b8e6a1d0c57-1",
            "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1.part",
        ];
        for name in foreign {
            touch(tmp.path(), name);
        }

        let report = sweep(tmp.path(), at(1_700_000_000)).unwrap();
        assert_eq!(report.skipped, foreign.len());
        assert_eq!(report.removed, 0);
        for name in foreign {
            assert!(tmp.path().join(name).exists());
        }
    }

    #[test]
    fn test_sweep_skips_directories() {
        let tmp = TempDir::new().unwrap();
        let name = encode_key(generate_id(), 1);
        fs::create_dir(tmp.path().join(&name)).unwrap();

        let report = sweep(tmp.path(), at(1_700_000_000)).unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(tmp.path().join(&name).is_dir());
    }

    #[test]
    fn test_sweep_missing_directory_errors() {
        let tmp = TempDir::new().unwrap();
        let result = sweep(&tmp.path().join("gone"), Utc::now());
        assert!(matches!(result, Err(StoreError::DirectoryUnreadable { .. })));
    }

    #[test]
    fn test_sweep_continues_after_failed_delete() {
        let tmp = TempDir::new().unwrap();
        let stuck = encode_key(generate_id(), 10);
        let others: Vec<String> = (0..4)
            .map(|i| encode_key(generate_id(), 20 + i))
            .collect();
        for name in others.iter().chain(std::iter::once(&stuck)) {
            touch(tmp.path(), name);
        }

        let mut attempts = 0;
        let report = sweep_with(tmp.path(), at(1_700_000_000), |path| {
            attempts += 1;
            if path.ends_with(&stuck) {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"))
            } else {
                fs::remove_file(path)
            }
        })
        .unwrap();

        assert_eq!(attempts, 5);
        assert_eq!(report.failed, 1);
        assert_eq!(report.removed, 4);
        assert!(tmp.path().join(&stuck).exists());
        for name in &others {
            assert!(!tmp.path().join(name).exists());
        }
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &encode_key(generate_id(), 1));

        let now = at(1_700_000_000);
        assert_eq!(sweep(tmp.path(), now).unwrap().removed, 1);
        assert_eq!(sweep(tmp.path(), now).unwrap(), SweepReport::default());
    }

    #[test]
    fn test_reaper_interval_is_clamped() {
        let reaper = Reaper::new("/tmp", Duration::ZERO);
        assert_eq!(reaper.interval(), MIN_INTERVAL);
    }

    #[tokio::test]
    async fn test_reaper_sweeps_immediately_on_start() {
        let tmp = TempDir::new().unwrap();
        let expired = encode_key(generate_id(), 1);
        let live = encode_key(generate_id(), i64::from(u32::MAX) * 4);
        touch(tmp.path(), &expired);
        touch(tmp.path(), &live);

        let handle = Reaper::new(tmp.path(), Duration::from_secs(3_600)).spawn();

        let expired_path = tmp.path().join(&expired);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while expired_path.exists() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(!expired_path.exists());
        assert!(tmp.path().join(&live).exists());
    }

    #[tokio::test]
    async fn test_reaper_survives_listing_failure() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("later");

        let handle = Reaper::new(&dir, Duration::from_millis(20)).spawn();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!handle.is_finished());

        fs::create_dir(&dir).unwrap();
        let expired = dir.join(encode_key(generate_id(), 1));
        fs::write(&expired, b"x").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while expired.exists() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(!expired.exists());
    }

    #[tokio::test]
    async fn test_sweep_once_reports() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &encode_key(generate_id(), 1));

        let reaper = Reaper::new(tmp.path(), Duration::from_secs(60));
        let report = reaper.sweep_once().await.unwrap();
        assert_eq!(report.removed, 1);

        let missing = Reaper::new(tmp.path().join("nope"), Duration::from_secs(60));
        assert!(missing.sweep_once().await.is_none());
    }
}
