//! Age-based cache eviction.

use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tracing::instrument;

use super::guide_cache::GuideCache;

/// Default retention for cache entries.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Seconds per day.
const SECS_PER_DAY: u64 = 86_400;

/// Converts a retention period in days to a `Duration`.
#[must_use]
pub fn retention_from_days(days: u32) -> Duration {
    Duration::from_secs(u64::from(days).saturating_mul(SECS_PER_DAY))
}

/// Counters reported by an eviction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionStats {
    /// Entries inspected.
    pub scanned: usize,
    /// Entries deleted.
    pub removed: usize,
    /// Entries that could not be inspected or deleted.
    pub failed: usize,
}

/// Age of a file relative to `now`, by creation time when the platform
/// reports one, otherwise by modification time.
fn file_age(path: &Path, now: SystemTime) -> Result<Duration> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    let stamp = meta
        .created()
        .or_else(|_| meta.modified())
        .with_context(|| format!("no timestamp for {}", path.display()))?;
    Ok(now.duration_since(stamp).unwrap_or_default())
}

impl GuideCache {
    /// Deletes entries older than `retention` as of `now`.
    ///
    /// Channel directories left empty are removed. Failures on single
    /// entries are logged and counted, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cache root exists but cannot be listed.
    #[instrument(skip_all, fields(dir = %self.dir().display()))]
    pub fn evict_older_than(&self, retention: Duration, now: SystemTime) -> Result<EvictionStats> {
        let mut stats = EvictionStats::default();

        let channels = match std::fs::read_dir(self.dir()) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to list {}", self.dir().display()));
            }
        };

        for channel in channels.flatten() {
            let channel_dir = channel.path();
            if !channel_dir.is_dir() {
                continue;
            }
            let entries = match std::fs::read_dir(&channel_dir) {
                Ok(rd) => rd,
                Err(e) => {
                    tracing::warn!(path = %channel_dir.display(), error = %e, "Failed to list cache directory");
                    stats.failed = stats.failed.saturating_add(1);
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                stats.scanned = stats.scanned.saturating_add(1);
                match file_age(&path, now) {
                    Ok(age) if age > retention => match std::fs::remove_file(&path) {
                        Ok(()) => {
                            tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "Evicted cache entry");
                            stats.removed = stats.removed.saturating_add(1);
                        }
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Failed to delete cache entry");
                            stats.failed = stats.failed.saturating_add(1);
                        }
                    },
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %format!("{e:#}"), "Failed to inspect cache entry");
                        stats.failed = stats.failed.saturating_add(1);
                    }
                }
            }

            // Only succeeds when empty.
            if std::fs::remove_dir(&channel_dir).is_ok() {
                tracing::debug!(path = %channel_dir.display(), "Removed empty cache directory");
            }
        }

        tracing::info!(
            scanned = stats.scanned,
            removed = stats.removed,
            failed = stats.failed,
            "Cache eviction completed"
        );
        Ok(stats)
    }
}
