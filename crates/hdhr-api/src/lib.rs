//! API client library for hdhr2iptv.
//!
//! Talks to HDHomeRun tuners and the HDHomeRun cloud service: device
//! discovery, channel lineups and the paginated program guide.

mod api;
mod client;
mod de;
mod discovery;
mod error;
mod rate_limiter;
mod types;

pub use api::{DeviceSource, GuideApi, LocalDeviceSource, LocalGuideApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{HdhrClient, HdhrClientBuilder};
pub use discovery::{CloudDiscovery, DirectDiscovery};
#[allow(clippy::module_name_repetitions)]
pub use error::HdhrError;
pub use types::{
    DeviceDiscovery, DiscoverEntry, Device, GuideChannel, GuidePage, LineupChannel, Program,
};
