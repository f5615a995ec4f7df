//! `HdhrClient` - HDHomeRun HTTP client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::LocalGuideApi;
use super::error::HdhrError;
use super::rate_limiter::{DEFAULT_MIN_INTERVAL, HdhrRateLimiter};
use super::types::{DeviceDiscovery, DiscoverEntry, GuideChannel, GuidePage, LineupChannel};

/// Default guide endpoint.
pub const DEFAULT_GUIDE_URL: &str = "https://api.hdhomerun.com/api/guide.php";

/// Default cloud discovery endpoint.
pub const DEFAULT_DISCOVER_URL: &str = "https://api.hdhomerun.com/discover";

/// Maximum number of redirects followed for one request.
const MAX_REDIRECTS: usize = 5;

/// Default number of retries after the first attempt.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default base delay between retries (multiplied by the attempt number).
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body preview length used in decode errors.
const BODY_PREVIEW_CHARS: usize = 200;

/// HDHomeRun API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct HdhrClient {
    /// HTTP client (reqwest, gzip enabled, bounded redirects).
    http_client: Client,
    /// Guide endpoint.
    guide_url: Url,
    /// Cloud discovery endpoint.
    discover_url: Url,
    /// Retries after the first attempt.
    max_retries: u32,
    /// Base retry delay.
    retry_delay: Duration,
    /// Rate limiter.
    rate_limiter: Arc<Mutex<HdhrRateLimiter>>,
}

/// Builder for `HdhrClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct HdhrClientBuilder {
    guide_url: Option<Url>,
    discover_url: Option<Url>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
    max_retries: Option<u32>,
    retry_delay: Option<Duration>,
}

impl HdhrClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            guide_url: None,
            discover_url: None,
            user_agent: None,
            min_interval: None,
            max_retries: None,
            retry_delay: None,
        }
    }

    /// Overrides the guide endpoint (for wiremock in tests).
    #[must_use]
    pub fn guide_url(mut self, url: Url) -> Self {
        self.guide_url = Some(url);
        self
    }

    /// Overrides the cloud discovery endpoint.
    #[must_use]
    pub fn discover_url(mut self, url: Url) -> Self {
        self.discover_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 1s).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Sets the number of retries after the first attempt (default: 5).
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Sets the base retry delay (default: 1s). Retry `n` waits `n * delay`.
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<HdhrClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;

        let guide_url = if let Some(url) = self.guide_url {
            url
        } else {
            Url::parse(DEFAULT_GUIDE_URL).context("invalid default guide URL")?
        };
        let discover_url = if let Some(url) = self.discover_url {
            url
        } else {
            Url::parse(DEFAULT_DISCOVER_URL).context("invalid default discover URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let rate_limiter = Arc::new(Mutex::new(HdhrRateLimiter::new(
            self.min_interval.unwrap_or(DEFAULT_MIN_INTERVAL),
        )));

        Ok(HdhrClient {
            http_client,
            guide_url,
            discover_url,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
            rate_limiter,
        })
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
enum AttemptError {
    /// Transient failure; try again after `retry_after` or the backoff.
    Retryable {
        message: String,
        retry_after: Option<Duration>,
    },
    /// Permanent failure; do not retry.
    Fatal(String),
}

impl HdhrClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> HdhrClientBuilder {
        HdhrClientBuilder::new()
    }

    /// Builds the `guide.php` URL for one window.
    ///
    /// `DeviceAuth` goes into the query string only; it is never logged.
    fn guide_request_url(&self, device_auth: &str, channel_number: &str, start: Option<i64>) -> Url {
        let mut url = self.guide_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("DeviceAuth", device_auth)
                .append_pair("Channel", channel_number);
            if let Some(start) = start {
                pairs.append_pair("Start", &start.to_string());
            }
        }
        url
    }

    /// Decodes a JSON body, attaching a short preview on failure.
    fn decode<T: DeserializeOwned>(command: &str, body: &str) -> Result<T> {
        serde_json::from_str(body).with_context(|| {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            format!(
                "{command} JSON decoding failed (len={}): {preview}",
                body.len()
            )
        })
    }

    /// Sends one GET and classifies the outcome.
    async fn try_once(&self, url: &Url) -> std::result::Result<String, AttemptError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_redirect() {
                    AttemptError::Fatal(format!("{e} (more than {MAX_REDIRECTS} redirects)"))
                } else {
                    AttemptError::Retryable {
                        message: e.to_string(),
                        retry_after: None,
                    }
                }
            })?;

        let status = response.status();
        tracing::trace!(%status, headers = ?response.headers(), "Response headers");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| Duration::from_secs(secs.saturating_add(1)));
            return Err(AttemptError::Retryable {
                message: format!("rate limited (HTTP {status})"),
                retry_after,
            });
        }
        if status.is_server_error() {
            return Err(AttemptError::Retryable {
                message: format!("HTTP {status}"),
                retry_after: None,
            });
        }
        if !status.is_success() {
            return Err(AttemptError::Fatal(format!("HTTP {status}")));
        }

        response.text().await.map_err(|e| AttemptError::Retryable {
            message: format!("failed to read body: {e}"),
            retry_after: None,
        })
    }

    /// Sends a GET request with retry logic and decodes the JSON body.
    ///
    /// Connection failures, body read failures, HTTP 5xx and 429 are
    /// retried up to `max_retries` times; retry `n` waits `n * retry_delay`
    /// (or `Retry-After` when the server sends one). Other HTTP errors and
    /// undecodable bodies fail immediately.
    async fn get_json<T: DeserializeOwned>(&self, command: &str, url: &Url) -> Result<T> {
        let attempts = self.max_retries.saturating_add(1);
        let mut delay = Duration::ZERO;
        let mut last_message = String::new();

        for attempt in 1..=attempts {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.rate_limiter.lock().await.wait().await;

            match self.try_once(url).await {
                Ok(body) => {
                    tracing::debug!(%command, attempt, body_len = body.len(), "Response body received");
                    return Self::decode(command, &body);
                }
                Err(AttemptError::Fatal(message)) => {
                    tracing::warn!(%command, attempt, error = %message, "Request rejected");
                    return Err(HdhrError::Transport {
                        command: String::from(command),
                        attempts: attempt,
                        message,
                    }
                    .into());
                }
                Err(AttemptError::Retryable {
                    message,
                    retry_after,
                }) => {
                    delay = retry_after.unwrap_or_else(|| self.retry_delay.saturating_mul(attempt));
                    if attempt < attempts {
                        tracing::warn!(
                            %command,
                            attempt,
                            max_attempts = attempts,
                            delay_ms = delay.as_millis(),
                            error = %message,
                            "Request failed, will retry"
                        );
                    }
                    last_message = message;
                }
            }
        }

        tracing::error!(%command, attempts, error = %last_message, "Reached max retries");
        Err(HdhrError::Transport {
            command: String::from(command),
            attempts,
            message: last_message,
        }
        .into())
    }

    /// Lists devices registered from this network with the cloud service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries or the body is
    /// not a discover listing.
    #[instrument(skip_all)]
    pub async fn discover_cloud(&self) -> Result<Vec<DiscoverEntry>> {
        tracing::info!(url = %self.discover_url, "Getting connected devices");
        self.get_json("Discover", &self.discover_url).await
    }

    /// Fetches a device's own `discover.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is invalid, the request fails after
    /// retries, or the body is not a discover document.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn discover_device(&self, url: &str) -> Result<DeviceDiscovery> {
        let url = Url::parse(url).with_context(|| format!("invalid discover URL: {url}"))?;
        self.get_json("DeviceDiscover", &url).await
    }
}

impl LocalGuideApi for HdhrClient {
    #[instrument(skip(self, device_auth))]
    async fn fetch_guide(
        &self,
        device_auth: &str,
        channel_number: &str,
        start: Option<i64>,
    ) -> Result<GuidePage> {
        let url = self.guide_request_url(device_auth, channel_number, start);
        tracing::info!(channel = channel_number, ?start, "Getting channel guide");
        let entries: Vec<GuideChannel> = self.get_json("GuideLookup", &url).await?;
        Ok(GuidePage::new(channel_number, start, entries))
    }

    #[instrument(skip(self))]
    async fn fetch_lineup(&self, lineup_url: &str) -> Result<Vec<LineupChannel>> {
        let url =
            Url::parse(lineup_url).with_context(|| format!("invalid lineup URL: {lineup_url}"))?;
        tracing::info!("Getting lineup");
        self.get_json("Lineup", &url).await
    }
}
