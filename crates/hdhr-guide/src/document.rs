//! XMLTV document model.

/// `<channel>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelElement {
    /// Channel number, used as the XMLTV channel id.
    pub id: String,
    /// `<display-name>` values in output order.
    pub display_names: Vec<String>,
    /// Station logo (`<icon src>`).
    pub icon: Option<String>,
}

/// `<episode-num system="..">` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeNum {
    /// Numbering system (`xmltv_ns`, `onscreen`, ...).
    pub system: &'static str,
    /// Element text.
    pub value: String,
}

/// Novelty marker of an episodic program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Novelty {
    /// `<new/>`
    New,
    /// `<previously-shown/>` followed by `<previously-aired/>`
    PreviouslyShown,
}

/// `<programme>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammeElement {
    /// Channel id this program airs on.
    pub channel: String,
    /// XMLTV start timestamp.
    pub start: String,
    /// XMLTV stop timestamp.
    pub stop: String,
    /// Program title.
    pub title: String,
    /// Episode title.
    pub sub_title: Option<String>,
    /// Synopsis.
    pub desc: Option<String>,
    /// Episode numbering, empty for non-episodic programs.
    pub episode_nums: Vec<EpisodeNum>,
    /// Program artwork.
    pub icon: Option<String>,
    /// Categories in output order.
    pub categories: Vec<String>,
    /// Novelty marker, episodic programs only.
    pub novelty: Option<Novelty>,
}

/// Complete guide: all channels, then all programs, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideDocument {
    /// Channel elements.
    pub channels: Vec<ChannelElement>,
    /// Programme elements.
    pub programmes: Vec<ProgrammeElement>,
}
