//! M3U playlist for one device.

use hdhr_api::LineupChannel;

/// Line terminator used by the playlist.
const CRLF: &str = "\r\n";

/// One playable channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// Channel number.
    pub number: String,
    /// Display name.
    pub name: String,
    /// Playback URL on the device.
    pub url: String,
    /// Favorite on the device.
    pub favorite: bool,
    /// HD channel.
    pub hd: bool,
}

impl PlaylistEntry {
    /// `#EXTGRP` value for this entry, if any.
    #[must_use]
    pub const fn group(&self) -> Option<&'static str> {
        match (self.favorite, self.hd) {
            (true, true) => Some("Favorites;HD"),
            (true, false) => Some("Favorites"),
            (false, true) => Some("HD"),
            (false, false) => None,
        }
    }
}

impl From<&LineupChannel> for PlaylistEntry {
    fn from(channel: &LineupChannel) -> Self {
        Self {
            number: channel.guide_number.clone(),
            name: channel.guide_name.clone(),
            url: channel.url.clone(),
            favorite: channel.favorite,
            hd: channel.hd,
        }
    }
}

/// Ordered playlist of one device's lineup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    /// Entries in lineup order.
    pub entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// Builds a playlist from a full lineup, keeping its order.
    #[must_use]
    pub fn from_lineup(lineup: &[LineupChannel]) -> Self {
        Self {
            entries: lineup.iter().map(PlaylistEntry::from).collect(),
        }
    }

    /// Renders the playlist as extended M3U with CRLF line endings.
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = vec![String::from("#EXTM3U")];
        for entry in &self.entries {
            lines.push(format!(
                "#EXTINF:-1 channel-id=\"{n}\" channel-number=\"{n}\" tvg-id=\"{n}\" tvg-name=\"{name}\" tvg-chno=\"{n}\",{name}",
                n = entry.number,
                name = entry.name,
            ));
            if let Some(group) = entry.group() {
                lines.push(format!("#EXTGRP:{group}"));
            }
            lines.push(entry.url.clone());
        }
        lines.push(String::new());
        lines.join(CRLF)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn lineup() -> Vec<LineupChannel> {
        serde_json::from_str(include_str!("../../../fixtures/hdhr/lineup.json")).unwrap()
    }

    #[test]
    fn test_group_tags() {
        // Arrange
        let playlist = Playlist::from_lineup(&lineup());

        // Act
        let groups: Vec<Option<&str>> = playlist.entries.iter().map(PlaylistEntry::group).collect();

        // Assert
        assert_eq!(groups, vec![Some("Favorites;HD"), Some("HD"), None]);
    }

    #[test]
    fn test_render_favorite_hd_channel() {
        // Arrange
        let playlist = Playlist::from_lineup(&lineup());

        // Act
        let m3u = playlist.render();

        // Assert
        assert!(m3u.starts_with("#EXTM3U\r\n"));
        assert!(m3u.contains(
            "#EXTINF:-1 channel-id=\"5.1\" channel-number=\"5.1\" tvg-id=\"5.1\" tvg-name=\"KNBC\" tvg-chno=\"5.1\",KNBC\r\n#EXTGRP:Favorites;HD\r\nhttp://192.168.1.20:5004/auto/v5.1\r\n"
        ));
    }

    #[test]
    fn test_render_favorite_sd_channel() {
        // Arrange
        let playlist = Playlist {
            entries: vec![PlaylistEntry {
                number: String::from("9.1"),
                name: String::from("KCET"),
                url: String::from("http://192.168.1.20:5004/auto/v9.1"),
                favorite: true,
                hd: false,
            }],
        };

        // Act
        let m3u = playlist.render();

        // Assert
        assert!(m3u.contains("\r\n#EXTGRP:Favorites\r\nhttp://192.168.1.20:5004/auto/v9.1\r\n"));
        assert!(!m3u.contains(";HD"));
    }

    #[test]
    fn test_render_full_layout() {
        // Arrange
        let playlist = Playlist::from_lineup(&lineup());

        // Act
        let m3u = playlist.render();
        let lines: Vec<&str> = m3u.split("\r\n").collect();

        // Assert
        assert_eq!(lines.len(), 10);
        assert_eq!(lines.get(5), Some(&"#EXTGRP:HD"));
        assert_eq!(
            lines.get(7),
            Some(&"#EXTINF:-1 channel-id=\"7.2\" channel-number=\"7.2\" tvg-id=\"7.2\" tvg-name=\"LOCALish\" tvg-chno=\"7.2\",LOCALish")
        );
        assert_eq!(lines.get(8), Some(&"http://192.168.1.20:5004/auto/v7.2"));
        assert_eq!(lines.get(9), Some(&""));
        assert!(!m3u.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_empty_lineup_renders_header_only() {
        // Arrange
        let playlist = Playlist::from_lineup(&[]);

        // Act
        let m3u = playlist.render();

        // Assert
        assert_eq!(m3u, "#EXTM3U\r\n");
    }
}
