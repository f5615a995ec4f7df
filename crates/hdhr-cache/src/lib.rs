//! File cache for guide pages.
//!
//! One JSON file per `(channel number, requested start)` under a directory
//! per channel, holding the upstream `guide.php` array verbatim. Only
//! non-empty pages are stored; files past the retention age are evicted
//! after each run.

mod eviction;
mod fs;
mod guide_cache;

pub use eviction::{DEFAULT_RETENTION_DAYS, EvictionStats, retention_from_days};
pub use fs::{path_component, write_atomic};
#[allow(clippy::module_name_repetitions)]
pub use guide_cache::GuideCache;
