//! One conversion run: discover, assemble, write, evict.

use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::Local;
use hdhr_api::{CloudDiscovery, Device, DirectDiscovery, HdhrClient, HdhrError, LocalDeviceSource};
use hdhr_cache::{GuideCache, retention_from_days};
use hdhr_guide::{AssembleOptions, TransformContext, assemble, write_outputs};
use tracing::instrument;

use crate::config::RunSettings;

/// Lists devices from the configured URLs, or from the cloud when none
/// are configured.
async fn discover(settings: &RunSettings, client: &HdhrClient) -> Result<Vec<Device>> {
    if settings.discover_urls.is_empty() {
        CloudDiscovery::new(client).list_devices().await
    } else {
        DirectDiscovery::new(client, settings.discover_urls.clone())
            .list_devices()
            .await
    }
}

/// Generates the guide and playlists once.
///
/// Finding no devices is not an error: a warning is logged and existing
/// output files are left untouched.
///
/// # Errors
///
/// Returns an error if discovery fails for a reason other than finding no
/// devices, or if writing the output files fails.
#[instrument(skip_all)]
pub async fn run_once(settings: &RunSettings, client: &HdhrClient) -> Result<()> {
    tracing::info!("Getting HDHomeRun devices");
    let devices = match discover(settings, client).await {
        Ok(devices) => devices,
        Err(e) if HdhrError::is_no_devices(&e) => {
            tracing::warn!("No HDHomeRun devices detected, output left unchanged");
            return Ok(());
        }
        Err(e) => return Err(e).context("device discovery failed"),
    };

    let cache = GuideCache::new(settings.cache_dir.clone());
    let ctx = TransformContext::new(Local, Local::now().date_naive());
    let options = AssembleOptions {
        favorites_only: settings.favorites_only,
    };
    let assembly = assemble(client, &cache, &ctx, &devices, options).await;

    write_outputs(&settings.output_dir, &settings.xmltv_filename, &assembly)
        .context("failed to write output files")?;
    Ok(())
}

/// Deletes cache entries past the retention period. Failures are logged.
pub fn evict_cache(settings: &RunSettings) {
    let cache = GuideCache::new(settings.cache_dir.clone());
    if let Err(e) = cache.evict_older_than(
        retention_from_days(settings.retention_days),
        SystemTime::now(),
    ) {
        tracing::warn!(error = %format!("{e:#}"), "Cache eviction failed");
    }
}

/// Runs once, then evicts the cache whether or not the run succeeded.
///
/// # Errors
///
/// Returns the run error, if any.
pub async fn run_and_evict(settings: &RunSettings, client: &HdhrClient) -> Result<()> {
    let result = run_once(settings, client).await;
    evict_cache(settings);
    result
}
