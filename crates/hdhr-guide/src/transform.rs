//! Program and channel conversion to XMLTV elements.
//!
//! Fills in what the guide service leaves out: season/episode numbers for
//! episodic programs without an episode code, and new/repeat markers.

use std::fmt::Display;
use std::sync::LazyLock;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, TimeZone};
use hdhr_api::{GuideChannel, LineupChannel, Program};
use regex::Regex;

use super::document::{ChannelElement, EpisodeNum, Novelty, ProgrammeElement};
use super::timestamp::{to_zoned, utc_date, xmltv_timestamp};

/// Regex for `SxxEyy` episode codes.
#[allow(clippy::expect_used)]
static EPISODE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*S(\d+)\s*E(\d+)").expect("failed to compile episode code regex")
});

/// Filter tag marking a movie (compared case-insensitively).
const MOVIE_TAG: &str = "movies";

/// Parses an `SxxEyy` code into `(season, episode)`.
#[must_use]
pub fn parse_episode_code(code: &str) -> Option<(i64, i64)> {
    let caps = EPISODE_CODE_RE.captures(code)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    Some((season, episode))
}

/// Season/episode derived from an air date: `(year, MMDD)`.
fn synthesized_numbering(air_date: NaiveDate) -> (i64, i64) {
    let episode = i64::from(air_date.month())
        .saturating_mul(100)
        .saturating_add(i64::from(air_date.day()));
    (i64::from(air_date.year()), episode)
}

/// `true` when any filter tag equals `movies`, ignoring case.
fn is_movie(program: &Program) -> bool {
    program
        .filter
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(MOVIE_TAG))
}

/// Converts guide programs to XMLTV elements.
///
/// `today` stands in for a missing original air date; passing it in keeps
/// the conversion deterministic.
#[derive(Debug, Clone)]
pub struct TransformContext<Tz: TimeZone> {
    tz: Tz,
    today: NaiveDate,
}

impl<Tz> TransformContext<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Creates a context rendering times in `tz`.
    #[must_use]
    pub const fn new(tz: Tz, today: NaiveDate) -> Self {
        Self { tz, today }
    }

    /// Converts one program of `channel_number`.
    ///
    /// # Errors
    ///
    /// Returns an error if a timestamp is outside the representable range.
    pub fn transform_program(
        &self,
        program: &Program,
        channel_number: &str,
    ) -> Result<ProgrammeElement> {
        let movie = is_movie(program);
        let episodic =
            !movie && (program.episode_title.is_some() || program.episode_number.is_some());

        let mut categories: Vec<String> =
            program.filter.iter().map(|tag| tag.to_lowercase()).collect();
        if movie {
            categories.push(String::from("Movie"));
        } else if episodic {
            categories.push(String::from("Series"));
        }

        let mut episode_nums = Vec::new();
        let mut novelty = None;
        if episodic {
            let air_date = program
                .original_airdate
                .and_then(utc_date)
                .unwrap_or(self.today);
            let (season, episode) = program
                .episode_number
                .as_deref()
                .and_then(parse_episode_code)
                .unwrap_or_else(|| synthesized_numbering(air_date));

            let onscreen = format!("S{season:02}E{episode:02}");
            episode_nums.push(EpisodeNum {
                system: "xmltv_ns",
                value: format!(
                    "{:02}.{:02}.",
                    season.saturating_sub(1),
                    episode.saturating_sub(1)
                ),
            });
            episode_nums.push(EpisodeNum {
                system: "onscreen",
                value: onscreen.clone(),
            });
            episode_nums.push(EpisodeNum {
                system: "SxxExx",
                value: onscreen,
            });
            episode_nums.push(EpisodeNum {
                system: "original-air-date",
                value: air_date.format("%Y-%m-%d").to_string(),
            });

            let start_date = to_zoned(&self.tz, program.start_time)?.date_naive();
            novelty = Some(if air_date >= start_date {
                Novelty::New
            } else {
                Novelty::PreviouslyShown
            });
        }

        Ok(ProgrammeElement {
            channel: String::from(channel_number),
            start: xmltv_timestamp(&self.tz, program.start_time)?,
            stop: xmltv_timestamp(&self.tz, program.end_time)?,
            title: program.title.clone(),
            sub_title: program.episode_title.clone(),
            desc: program.synopsis.clone(),
            episode_nums,
            icon: program.image_url.clone(),
            categories,
            novelty,
        })
    }
}

/// Converts a lineup channel, enriched with the guide header when present.
///
/// Display names: affiliate, lineup name, guide name, number; blanks and
/// repeats are dropped.
#[must_use]
pub fn transform_channel(lineup: &LineupChannel, header: Option<&GuideChannel>) -> ChannelElement {
    let candidates = [
        header.and_then(|h| h.affiliate.as_deref()),
        Some(lineup.guide_name.as_str()),
        header.and_then(|h| h.guide_name.as_deref()),
        Some(lineup.guide_number.as_str()),
    ];

    let mut display_names: Vec<String> = Vec::new();
    for name in candidates.into_iter().flatten() {
        let name = name.trim();
        if !name.is_empty() && !display_names.iter().any(|n| n == name) {
            display_names.push(String::from(name));
        }
    }

    ChannelElement {
        id: lineup.guide_number.clone(),
        display_names,
        icon: header.and_then(|h| h.image_url.clone()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use chrono::Utc;

    use super::*;

    fn ctx() -> TransformContext<Utc> {
        TransformContext::new(Utc, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap())
    }

    fn fixture_programs() -> Vec<Program> {
        let json = include_str!("../../../fixtures/hdhr/guide_5_1.json");
        let mut entries: Vec<GuideChannel> = serde_json::from_str(json).unwrap();
        entries.remove(0).guide
    }

    fn bare_program(title: &str) -> Program {
        Program {
            title: String::from(title),
            start_time: 1_700_000_000,
            end_time: 1_700_003_600,
            episode_number: None,
            episode_title: None,
            synopsis: None,
            original_airdate: None,
            image_url: None,
            series_id: None,
            filter: Vec::new(),
        }
    }

    #[test]
    fn test_parse_episode_code() {
        // Arrange & Act & Assert
        assert_eq!(parse_episode_code("S03E05"), Some((3, 5)));
        assert_eq!(parse_episode_code("s1e12"), Some((1, 12)));
        assert_eq!(parse_episode_code("S2024E1105"), Some((2024, 1105)));
        assert_eq!(parse_episode_code("Episode 5"), None);
        assert_eq!(parse_episode_code(""), None);
    }

    #[test]
    fn test_minimal_program_has_no_derived_fields() {
        // Arrange
        let program = bare_program("News at 6");

        // Act
        let el = ctx().transform_program(&program, "5.1").unwrap();

        // Assert
        assert_eq!(el.title, "News at 6");
        assert_eq!(el.channel, "5.1");
        assert_eq!(el.start, "20231114221320 +0000");
        assert_eq!(el.stop, "20231114231320 +0000");
        assert!(el.categories.is_empty());
        assert!(el.episode_nums.is_empty());
        assert!(el.novelty.is_none());
    }

    #[test]
    fn test_episode_code_gives_legacy_numbering() {
        // Arrange
        let programs = fixture_programs();

        // Act
        let el = ctx().transform_program(&programs[1], "5.1").unwrap();

        // Assert
        let nums: Vec<(&str, &str)> = el
            .episode_nums
            .iter()
            .map(|n| (n.system, n.value.as_str()))
            .collect();
        assert_eq!(
            nums,
            vec![
                ("xmltv_ns", "02.04."),
                ("onscreen", "S03E05"),
                ("SxxExx", "S03E05"),
                ("original-air-date", "2023-11-14"),
            ]
        );
        assert_eq!(el.sub_title.as_deref(), Some("The Long Tide"));
        assert_eq!(el.categories, vec!["drama", "Series"]);
        assert_eq!(el.novelty, Some(Novelty::New));
    }

    #[test]
    fn test_movie_has_no_novelty_or_episode_num() {
        // Arrange
        let mut program = bare_program("The Great Escape");
        program.filter = vec![String::from("MOVIES")];
        program.episode_number = Some(String::from("S01E01"));
        program.original_airdate = Some(-207_705_600);

        // Act
        let el = ctx().transform_program(&program, "5.1").unwrap();

        // Assert
        assert_eq!(el.categories, vec!["movies", "Movie"]);
        assert!(el.episode_nums.is_empty());
        assert!(el.novelty.is_none());
    }

    #[test]
    fn test_episode_title_only_synthesizes_numbering_from_air_date() {
        // Arrange
        let mut program = bare_program("Morning Show");
        program.episode_title = Some(String::from("Spring Special"));
        // 2023-03-05 00:00:00 UTC
        program.original_airdate = Some(1_677_974_400);

        // Act
        let el = ctx().transform_program(&program, "5.1").unwrap();

        // Assert
        assert_eq!(el.episode_nums[0].value, "2022.304.");
        assert_eq!(el.episode_nums[1].value, "S2023E305");
        assert_eq!(el.episode_nums[3].value, "2023-03-05");
        assert_eq!(el.novelty, Some(Novelty::PreviouslyShown));
        assert_eq!(el.categories, vec!["Series"]);
    }

    #[test]
    fn test_missing_air_date_falls_back_to_today() {
        // Arrange
        let mut program = bare_program("Morning Show");
        program.episode_title = Some(String::from("Live"));

        // Act
        let el = ctx().transform_program(&program, "5.1").unwrap();

        // Assert
        assert_eq!(el.episode_nums[1].value, "S2023E1114");
        assert_eq!(el.novelty, Some(Novelty::New));
    }

    #[test]
    fn test_malformed_episode_code_is_still_episodic() {
        // Arrange
        let mut program = bare_program("Odd Numbering");
        program.episode_number = Some(String::from("EP0042"));
        program.original_airdate = Some(1_677_974_400);

        // Act
        let el = ctx().transform_program(&program, "5.1").unwrap();

        // Assert
        assert_eq!(el.episode_nums[1].value, "S2023E305");
        assert!(el.novelty.is_some());
    }

    #[test]
    fn test_transform_program_is_deterministic() {
        // Arrange
        let programs = fixture_programs();
        let context = ctx();

        // Act
        let first: Vec<ProgrammeElement> = programs
            .iter()
            .map(|p| context.transform_program(p, "5.1").unwrap())
            .collect();
        let second: Vec<ProgrammeElement> = programs
            .iter()
            .map(|p| context.transform_program(p, "5.1").unwrap())
            .collect();

        // Assert
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_channel_with_header() {
        // Arrange
        let lineup = LineupChannel {
            guide_number: String::from("5.1"),
            guide_name: String::from("KNBC"),
            url: String::from("http://192.168.1.20:5004/auto/v5.1"),
            favorite: true,
            hd: true,
        };
        let header = GuideChannel {
            guide_number: String::from("5.1"),
            guide_name: Some(String::from("KNBC")),
            affiliate: Some(String::from("NBC")),
            image_url: Some(String::from("https://img.hdhomerun.com/channels/US28211.png")),
            guide: Vec::new(),
        };

        // Act
        let el = transform_channel(&lineup, Some(&header));

        // Assert
        assert_eq!(el.id, "5.1");
        assert_eq!(el.display_names, vec!["NBC", "KNBC", "5.1"]);
        assert_eq!(
            el.icon.as_deref(),
            Some("https://img.hdhomerun.com/channels/US28211.png")
        );
    }

    #[test]
    fn test_transform_channel_without_header() {
        // Arrange
        let lineup = LineupChannel {
            guide_number: String::from("7.2"),
            guide_name: String::new(),
            url: String::new(),
            favorite: false,
            hd: false,
        };

        // Act
        let el = transform_channel(&lineup, None);

        // Assert
        assert_eq!(el.display_names, vec!["7.2"]);
        assert!(el.icon.is_none());
    }
}
