//! `AppConfig` struct, TOML loading and merge with CLI overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use hdhr_cache::DEFAULT_RETENTION_DAYS;
use hdhr_guide::DEFAULT_XMLTV_FILENAME;
use serde::{Deserialize, Serialize};

/// Log file name used when none is configured.
const DEFAULT_LOG_FILENAME: &str = "hdhr2iptv.log";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Output file settings.
    pub output: OutputConfig,
    /// Guide cache settings.
    pub cache: CacheConfig,
    /// Log file settings.
    pub log: LogConfig,
    /// Daily schedule.
    pub schedule: ScheduleConfig,
    /// Guide fetching switches.
    pub guide: GuideConfig,
    /// Explicit device list.
    pub devices: DevicesConfig,
    /// Upstream API endpoints and pacing.
    pub api: ApiConfig,
}

/// `[output]` section.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the XMLTV and M3U files.
    pub dir: PathBuf,
    /// XMLTV file name inside `dir`.
    pub xmltv_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            xmltv_filename: String::from(DEFAULT_XMLTV_FILENAME),
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory.
    pub dir: PathBuf,
    /// Entries older than this many days are evicted.
    pub retention_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./cache"),
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Log file (default: `{output.dir}/hdhr2iptv.log`).
    pub file: Option<PathBuf>,
}

/// `[schedule]` section.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Run daily at this hour (0-23) instead of once.
    pub daily_hour: Option<u32>,
}

/// `[guide]` section.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GuideConfig {
    /// Only fetch guide data for favorite channels.
    pub favorites_only: bool,
}

/// `[devices]` section.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DevicesConfig {
    /// Device `discover.json` URLs. Empty means cloud discovery.
    pub discover_urls: Vec<String>,
}

/// `[api]` section.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Guide endpoint override.
    pub guide_url: Option<String>,
    /// Cloud discovery endpoint override.
    pub discover_url: Option<String>,
    /// Minimum interval between requests.
    pub min_interval_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base retry delay.
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            guide_url: None,
            discover_url: None,
            min_interval_ms: 1_000,
            max_retries: 5,
            retry_delay_ms: 1_000,
        }
    }
}

impl ApiConfig {
    /// Minimum request interval as a `Duration`.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Base retry delay as a `Duration`.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Command line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// `--output-directory`
    pub output_dir: Option<PathBuf>,
    /// `--cache-directory`
    pub cache_dir: Option<PathBuf>,
    /// `--log-file`
    pub log_file: Option<PathBuf>,
    /// `--run-daily-hour`
    pub daily_hour: Option<u32>,
    /// `--favorites-only`
    pub favorites_only: bool,
}

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Output directory.
    pub output_dir: PathBuf,
    /// XMLTV file name.
    pub xmltv_filename: String,
    /// Cache directory.
    pub cache_dir: PathBuf,
    /// Cache retention in days.
    pub retention_days: u32,
    /// Log file.
    pub log_file: PathBuf,
    /// Daily run hour; `None` runs once.
    pub daily_hour: Option<u32>,
    /// Favorites-only guide fetching.
    pub favorites_only: bool,
    /// Explicit device URLs.
    pub discover_urls: Vec<String>,
    /// API settings.
    pub api: ApiConfig,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Merges the file values with command line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the daily hour is outside 0-23 or the XMLTV file
    /// name is not a plain file name.
    pub fn resolve(self, overrides: Overrides) -> Result<RunSettings> {
        let output_dir = overrides.output_dir.unwrap_or(self.output.dir);
        let log_file = overrides
            .log_file
            .or(self.log.file)
            .unwrap_or_else(|| output_dir.join(DEFAULT_LOG_FILENAME));

        let daily_hour = overrides.daily_hour.or(self.schedule.daily_hour);
        if let Some(hour) = daily_hour.filter(|h| *h > 23) {
            bail!("daily run hour must be between 0 and 23, got {hour}");
        }

        let xmltv_filename = self.output.xmltv_filename;
        if matches!(xmltv_filename.as_str(), "" | "." | "..")
            || xmltv_filename.contains(['/', '\\'])
        {
            bail!("output.xmltv_filename must be a plain file name, got {xmltv_filename:?}");
        }

        Ok(RunSettings {
            output_dir,
            xmltv_filename,
            cache_dir: overrides.cache_dir.unwrap_or(self.cache.dir),
            retention_days: self.cache.retention_days,
            log_file,
            daily_hour,
            favorites_only: overrides.favorites_only || self.guide.favorites_only,
            discover_urls: self.devices.discover_urls,
            api: self.api,
        })
    }
}
