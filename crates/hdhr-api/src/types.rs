//! HDHomeRun API response types.

use serde::{Deserialize, Serialize};

use super::de::{deserialize_empty_string_as_none, deserialize_flag, deserialize_null_as_default};

/// A tuner device resolved for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Device ID (hex string, e.g. `"1052ABCD"`).
    pub id: String,
    /// Absolute URL of the device's `lineup.json`.
    pub lineup_url: String,
    /// `DeviceAuth` token for the cloud guide API.
    pub auth_token: String,
}

/// One entry of the cloud `discover` listing.
///
/// Storage engines (DVR) appear in the same listing without a `DeviceID`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverEntry {
    /// Tuner device ID (absent for storage engines).
    #[serde(
        rename = "DeviceID",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub device_id: Option<String>,
    /// Storage engine ID (absent for tuners).
    #[serde(
        rename = "StorageID",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub storage_id: Option<String>,
    /// Device LAN address.
    #[serde(
        rename = "LocalIP",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub local_ip: Option<String>,
    /// URL of the device's `discover.json`.
    #[serde(
        rename = "DiscoverURL",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub discover_url: Option<String>,
    /// URL of the device's `lineup.json`.
    #[serde(
        rename = "LineupURL",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub lineup_url: Option<String>,
}

/// A device's own `discover.json` document.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceDiscovery {
    /// Device ID.
    #[serde(
        rename = "DeviceID",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub device_id: Option<String>,
    /// Cloud guide auth token.
    #[serde(
        rename = "DeviceAuth",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub device_auth: Option<String>,
    /// URL of the device's `lineup.json`.
    #[serde(
        rename = "LineupURL",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub lineup_url: Option<String>,
    /// Human readable device name.
    #[serde(
        rename = "FriendlyName",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub friendly_name: Option<String>,
    /// Model (e.g. `"HDHR5-4K"`).
    #[serde(
        rename = "ModelNumber",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub model_number: Option<String>,
    /// Number of tuners.
    #[serde(rename = "TunerCount", default)]
    pub tuner_count: Option<u32>,
}

/// One channel of a device lineup (`lineup.json`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineupChannel {
    /// Virtual channel number (e.g. `"5.1"`).
    #[serde(rename = "GuideNumber")]
    pub guide_number: String,
    /// Station name.
    #[serde(rename = "GuideName", default)]
    pub guide_name: String,
    /// Playback URL on the device.
    #[serde(rename = "URL", default)]
    pub url: String,
    /// Marked as favorite in the device configuration.
    #[serde(rename = "Favorite", deserialize_with = "deserialize_flag", default)]
    pub favorite: bool,
    /// High definition channel.
    #[serde(rename = "HD", deserialize_with = "deserialize_flag", default)]
    pub hd: bool,
}

/// A single program entry from `guide.php`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Program title.
    #[serde(rename = "Title", default)]
    pub title: String,
    /// Start time (unix seconds).
    #[serde(rename = "StartTime")]
    pub start_time: i64,
    /// End time (unix seconds).
    #[serde(rename = "EndTime")]
    pub end_time: i64,
    /// Episode code, usually `SxxEyy`.
    #[serde(
        rename = "EpisodeNumber",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub episode_number: Option<String>,
    /// Episode title.
    #[serde(
        rename = "EpisodeTitle",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub episode_title: Option<String>,
    /// Short description.
    #[serde(
        rename = "Synopsis",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub synopsis: Option<String>,
    /// Original air date (unix seconds, midnight UTC).
    #[serde(
        rename = "OriginalAirdate",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub original_airdate: Option<i64>,
    /// Program artwork.
    #[serde(
        rename = "ImageURL",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub image_url: Option<String>,
    /// Series identifier.
    #[serde(
        rename = "SeriesID",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub series_id: Option<String>,
    /// Filter tags (e.g. `"News"`, `"Movies"`).
    #[serde(
        rename = "Filter",
        deserialize_with = "deserialize_null_as_default",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub filter: Vec<String>,
}

/// One element of a `guide.php` response: channel header plus programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideChannel {
    /// Virtual channel number.
    #[serde(rename = "GuideNumber", default)]
    pub guide_number: String,
    /// Station name as known to the guide service.
    #[serde(
        rename = "GuideName",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub guide_name: Option<String>,
    /// Network affiliation (e.g. `"NBC"`).
    #[serde(
        rename = "Affiliate",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub affiliate: Option<String>,
    /// Station logo.
    #[serde(
        rename = "ImageURL",
        deserialize_with = "deserialize_empty_string_as_none",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub image_url: Option<String>,
    /// Programs in this time window.
    #[serde(
        rename = "Guide",
        deserialize_with = "deserialize_null_as_default",
        default
    )]
    pub guide: Vec<Program>,
}

/// One fetched guide window for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidePage {
    /// Channel the page was requested for.
    pub channel_number: String,
    /// Requested `Start` (`None` = "now" on the upstream side).
    pub requested_start: Option<i64>,
    /// Upstream response array, as returned.
    pub entries: Vec<GuideChannel>,
}

impl GuidePage {
    /// Creates a page from a decoded `guide.php` response.
    #[must_use]
    pub fn new(
        channel_number: impl Into<String>,
        requested_start: Option<i64>,
        entries: Vec<GuideChannel>,
    ) -> Self {
        Self {
            channel_number: channel_number.into(),
            requested_start,
            entries,
        }
    }

    /// Channel header (first array element), if any.
    #[must_use]
    pub fn header(&self) -> Option<&GuideChannel> {
        self.entries.first()
    }

    /// Programs of this page (first element's `Guide`).
    #[must_use]
    pub fn programs(&self) -> &[Program] {
        self.header()
            .map(|h| h.guide.as_slice())
            .unwrap_or_default()
    }

    /// `true` when the page carries no programs (pagination terminal).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs().is_empty()
    }

    /// Latest `EndTime` among the page's programs.
    #[must_use]
    pub fn max_end_time(&self) -> Option<i64> {
        self.programs().iter().map(|p| p.end_time).max()
    }
}
