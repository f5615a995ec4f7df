//! hdhr2iptv - M3U playlists and an XMLTV guide for HDHomeRun tuners.

/// Application configuration (TOML).
mod config;
/// Tracing subscriber setup.
mod logging;
/// Single conversion run.
mod runner;
/// Daily scheduling.
mod scheduler;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hdhr_api::HdhrClient;
use url::Url;

use crate::config::{AppConfig, Overrides, RunSettings, resolve_config_path};

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Directory for the XMLTV guide and M3U playlists.
    #[arg(short = 'o', long)]
    output_directory: Option<PathBuf>,

    /// Directory for cached guide pages.
    #[arg(short = 'c', long)]
    cache_directory: Option<PathBuf>,

    /// Log file (default: `<output-directory>/hdhr2iptv.log`).
    #[arg(short = 'l', long)]
    log_file: Option<PathBuf>,

    /// Keep running and regenerate every day at this hour (0-23).
    #[arg(short = 's', long, value_parser = clap::value_parser!(u32).range(0..24))]
    run_daily_hour: Option<u32>,

    /// Only fetch guide data for favorite channels.
    #[arg(short = 'f', long)]
    favorites_only: bool,

    /// Config file (default: `~/.config/hdhr2iptv/config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Command line values that override the config file.
    fn overrides(&self) -> Overrides {
        Overrides {
            output_dir: self.output_directory.clone(),
            cache_dir: self.cache_directory.clone(),
            log_file: self.log_file.clone(),
            daily_hour: self.run_daily_hour,
            favorites_only: self.favorites_only,
        }
    }
}

/// Builds the API client from the `[api]` settings.
fn build_client(settings: &RunSettings) -> Result<HdhrClient> {
    let api = &settings.api;
    let mut builder = HdhrClient::builder()
        .user_agent(USER_AGENT)
        .min_interval(api.min_interval())
        .max_retries(api.max_retries)
        .retry_delay(api.retry_delay());
    if let Some(raw) = &api.guide_url {
        let url = Url::parse(raw).with_context(|| format!("invalid api.guide_url: {raw}"))?;
        builder = builder.guide_url(url);
    }
    if let Some(raw) = &api.discover_url {
        let url = Url::parse(raw).with_context(|| format!("invalid api.discover_url: {raw}"))?;
        builder = builder.discover_url(url);
    }
    builder.build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_ref())?;
    let settings = AppConfig::load(&config_path)?.resolve(cli.overrides())?;
    let _log_guard = logging::init(&settings.log_file)?;
    tracing::debug!(config = %config_path.display(), ?settings, "Loaded settings");

    let result = match build_client(&settings) {
        Ok(client) => match settings.daily_hour {
            Some(hour) => scheduler::run_daily(&settings, &client, hour).await,
            None => runner::run_and_evict(&settings, &client).await,
        },
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "Run failed");
    }
    result
}
