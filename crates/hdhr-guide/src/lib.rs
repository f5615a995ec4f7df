//! Guide assembly for hdhr2iptv.
//!
//! Walks each channel's paginated guide, converts programs and channels
//! into XMLTV elements, builds one M3U playlist per device and writes the
//! results.

pub mod assembler;
pub mod document;
pub mod output;
pub mod paginator;
pub mod playlist;
pub mod timestamp;
pub mod transform;
pub mod xmltv;

pub use assembler::{AssembleOptions, Assembly, assemble};
pub use document::{ChannelElement, EpisodeNum, GuideDocument, Novelty, ProgrammeElement};
pub use output::{DEFAULT_XMLTV_FILENAME, write_outputs};
pub use paginator::GuidePaginator;
pub use playlist::{Playlist, PlaylistEntry};
pub use transform::{TransformContext, transform_channel};
