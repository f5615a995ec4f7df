//! Device discovery: cloud listing and explicit `discover.json` URLs.

use anyhow::Result;
use tracing::instrument;

use super::api::LocalDeviceSource;
use super::client::HdhrClient;
use super::error::HdhrError;
use super::types::Device;

/// Discovers tuners through the HDHomeRun cloud `discover` listing.
#[derive(Debug)]
pub struct CloudDiscovery<'a> {
    client: &'a HdhrClient,
}

impl<'a> CloudDiscovery<'a> {
    /// Creates a cloud discovery backed by `client`.
    #[must_use]
    pub const fn new(client: &'a HdhrClient) -> Self {
        Self { client }
    }
}

/// Discovers tuners by probing configured `discover.json` URLs.
#[derive(Debug)]
pub struct DirectDiscovery<'a> {
    client: &'a HdhrClient,
    urls: Vec<String>,
}

impl<'a> DirectDiscovery<'a> {
    /// Creates a direct discovery for the given device URLs.
    #[must_use]
    pub const fn new(client: &'a HdhrClient, urls: Vec<String>) -> Self {
        Self { client, urls }
    }
}

/// Fetches one device's `discover.json` and turns it into a [`Device`].
///
/// `fallback_lineup_url` is used when the device document omits `LineupURL`.
async fn resolve_device(
    client: &HdhrClient,
    discover_url: &str,
    fallback_lineup_url: Option<&str>,
) -> Result<Device> {
    let doc = client.discover_device(discover_url).await?;

    let missing = |field: &str| HdhrError::Discovery {
        url: String::from(discover_url),
        message: format!("missing {field}"),
    };
    let id = doc.device_id.ok_or_else(|| missing("DeviceID"))?;
    let auth_token = doc.device_auth.ok_or_else(|| missing("DeviceAuth"))?;
    let lineup_url = doc
        .lineup_url
        .or_else(|| fallback_lineup_url.map(String::from))
        .ok_or_else(|| missing("LineupURL"))?;

    tracing::info!(
        device_id = %id,
        model = doc.model_number.as_deref().unwrap_or("-"),
        tuners = doc.tuner_count.unwrap_or_default(),
        "Found tuner device"
    );
    Ok(Device {
        id,
        lineup_url,
        auth_token,
    })
}

/// Returns `devices`, or `HdhrError::NoDevices` when empty.
fn non_empty(devices: Vec<Device>) -> Result<Vec<Device>> {
    if devices.is_empty() {
        return Err(HdhrError::NoDevices.into());
    }
    Ok(devices)
}

impl LocalDeviceSource for CloudDiscovery<'_> {
    #[instrument(skip_all)]
    async fn list_devices(&self) -> Result<Vec<Device>> {
        let entries = self.client.discover_cloud().await?;

        let mut devices = Vec::new();
        for entry in entries {
            let Some(device_id) = entry.device_id else {
                tracing::debug!(
                    storage_id = entry.storage_id.as_deref().unwrap_or("-"),
                    "Skipping non-tuner entry"
                );
                continue;
            };
            let Some(discover_url) = entry.discover_url else {
                tracing::warn!(%device_id, "Tuner entry has no DiscoverURL, skipping");
                continue;
            };
            match resolve_device(self.client, &discover_url, entry.lineup_url.as_deref()).await {
                Ok(device) => devices.push(device),
                Err(e) => {
                    tracing::warn!(%device_id, url = %discover_url, error = %e, "Skipping device");
                }
            }
        }
        non_empty(devices)
    }
}

impl LocalDeviceSource for DirectDiscovery<'_> {
    #[instrument(skip_all, fields(count = self.urls.len()))]
    async fn list_devices(&self) -> Result<Vec<Device>> {
        let mut devices = Vec::new();
        for url in &self.urls {
            match resolve_device(self.client, url, None).await {
                Ok(device) => devices.push(device),
                Err(e) => tracing::warn!(%url, error = %e, "Skipping device"),
            }
        }
        non_empty(devices)
    }
}
