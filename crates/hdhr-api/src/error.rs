//! Error classification for HDHomeRun API failures.
//!
//! Errors travel as `anyhow::Error`; callers that need to branch on the
//! failure kind use `anyhow::Error::downcast_ref::<HdhrError>()`.

use thiserror::Error;

/// Classified HDHomeRun API error.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum HdhrError {
    /// Network or HTTP failure that persisted after all retries.
    #[error("{command} failed after {attempts} attempt(s): {message}")]
    Transport {
        /// Logical request name (e.g. `GuideLookup`).
        command: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last failure observed.
        message: String,
    },

    /// Discovery completed but found no tuner devices.
    #[error("no HDHomeRun tuner devices found")]
    NoDevices,

    /// A device discover document was malformed or incomplete.
    #[error("invalid discover response from {url}: {message}")]
    Discovery {
        /// Discover URL that was queried.
        url: String,
        /// What was wrong with the response.
        message: String,
    },
}

impl HdhrError {
    /// Returns `true` when `err` (or its context chain) is a transport failure.
    #[must_use]
    pub fn is_transport(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<Self>(), Some(Self::Transport { .. }))
    }

    /// Returns `true` when `err` (or its context chain) reports no devices.
    #[must_use]
    pub fn is_no_devices(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<Self>(), Some(Self::NoDevices))
    }
}
