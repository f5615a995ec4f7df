//! HDHomeRun API rate limiter.

use std::time::{Duration, Instant};

/// Default minimum interval between requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Single-tier rate limiter.
///
/// The guide service has no published quota; requests are spaced by a
/// fixed minimum interval so that a full lineup walk stays polite.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct HdhrRateLimiter {
    /// Minimum interval between requests.
    min_interval: Duration,
    /// Last request timestamp.
    last_request: Option<Instant>,
}

impl HdhrRateLimiter {
    /// Creates a new rate limiter with the given minimum interval.
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Waits until the next request is allowed.
    pub async fn wait(&mut self) {
        let now = Instant::now();

        if let Some(last) = self.last_request {
            let elapsed = now.duration_since(last);
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval.saturating_sub(elapsed)).await;
            }
        }

        self.last_request = Some(Instant::now());
    }
}
