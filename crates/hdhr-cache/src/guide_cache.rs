//! Guide page lookup, store and get-or-fetch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hdhr_api::{GuideChannel, GuidePage, LocalGuideApi};
use tracing::instrument;

use super::fs::{path_component, write_atomic};

/// On-disk guide page cache rooted at one directory.
///
/// Layout: `{dir}/{channel_number}/{start}.json`.
#[derive(Debug, Clone)]
pub struct GuideCache {
    dir: PathBuf,
}

impl GuideCache {
    /// Creates a cache rooted at `dir`. The directory is created lazily.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `(channel_number, start)`.
    #[must_use]
    pub fn entry_path(&self, channel_number: &str, start: i64) -> PathBuf {
        self.dir
            .join(path_component(channel_number))
            .join(format!("{start}.json"))
    }

    /// Loads a cached page.
    ///
    /// Returns `Ok(None)` when no entry exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be read or decoded.
    pub fn load(&self, channel_number: &str, start: i64) -> Result<Option<GuidePage>> {
        let path = self.entry_path(channel_number, start);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let entries: Vec<GuideChannel> = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to decode cache entry {}", path.display()))?;
        Ok(Some(GuidePage::new(channel_number, Some(start), entries)))
    }

    /// Stores a page.
    ///
    /// Empty pages and pages without a requested start are not stored;
    /// returns `Ok(true)` only when a file was written.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails.
    pub fn store(&self, page: &GuidePage) -> Result<bool> {
        let Some(start) = page.requested_start else {
            return Ok(false);
        };
        if page.is_empty() {
            return Ok(false);
        }
        let path = self.entry_path(&page.channel_number, start);
        let json = serde_json::to_vec(&page.entries).context("failed to encode guide page")?;
        write_atomic(&path, &json)?;
        tracing::debug!(path = %path.display(), bytes = json.len(), "Cached guide page");
        Ok(true)
    }

    /// Returns the cached page for `(channel_number, start)`, or fetches it.
    ///
    /// A hit never touches the network. On a miss the page is fetched and,
    /// when non-empty, stored. Cache read/write failures are logged and
    /// treated as a miss.
    ///
    /// # Errors
    ///
    /// Returns an error only if the live fetch fails.
    #[instrument(skip(self, api, device_auth))]
    pub async fn get_or_fetch(
        &self,
        api: &(impl LocalGuideApi + Sync),
        device_auth: &str,
        channel_number: &str,
        start: i64,
    ) -> Result<GuidePage> {
        match self.load(channel_number, start) {
            Ok(Some(page)) => {
                tracing::debug!("Cache hit");
                return Ok(page);
            }
            Ok(None) => tracing::debug!("Cache miss"),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "Cache read failed, fetching"),
        }

        let page = api
            .fetch_guide(device_auth, channel_number, Some(start))
            .await?;

        if let Err(e) = self.store(&page) {
            tracing::warn!(error = %format!("{e:#}"), "Cache write failed");
        }
        Ok(page)
    }
}
