//! `GuideApi` and `DeviceSource` trait definitions.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{Device, GuidePage, LineupChannel};

/// HDHomeRun lineup and guide API.
///
/// Abstracts the network so the paginator and assembler can run against
/// canned pages in tests. Uses `trait_variant::make` to generate a
/// `Send`-bound async trait.
#[trait_variant::make(GuideApi: Send)]
pub trait LocalGuideApi {
    /// Fetches one guide window for a channel.
    ///
    /// `start = None` asks the service for the window starting now.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails after retries or the
    /// body is not a guide response.
    async fn fetch_guide(
        &self,
        device_auth: &str,
        channel_number: &str,
        start: Option<i64>,
    ) -> Result<GuidePage>;

    /// Fetches a device lineup.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails after retries or the
    /// body is not a lineup.
    async fn fetch_lineup(&self, lineup_url: &str) -> Result<Vec<LineupChannel>>;
}

/// Source of tuner devices for a run.
#[trait_variant::make(DeviceSource: Send)]
pub trait LocalDeviceSource {
    /// Lists the tuner devices available for this run.
    ///
    /// # Errors
    ///
    /// Returns `HdhrError::NoDevices` when nothing was found, or a
    /// transport error if discovery itself failed.
    async fn list_devices(&self) -> Result<Vec<Device>>;
}
