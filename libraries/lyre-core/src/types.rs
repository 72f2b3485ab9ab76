/// Track and playlist domain types
use serde::{Deserialize, Serialize};

/// Fallback artist label for tracks without artist metadata
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Audio track as produced by the library importer
///
/// Immutable once created. Identity is the `url`; `name` disambiguates
/// catalogs that list the same URL more than once, so duplicates are
/// tolerated rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Track {
    /// Resource URL the audio primitive plays from
    pub url: String,

    /// File name as listed by the importer
    pub name: String,

    /// Track title from tags
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Cover art reference (URL or path)
    pub cover: String,

    /// Duration in seconds (0 when unknown)
    pub duration: f64,
}

impl Track {
    /// Create a track with only its identity set
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether `other` is the same catalog entry (`url` + `name`)
    pub fn same_entry(&self, other: &Track) -> bool {
        self.url == other.url && self.name == other.name
    }

    /// Whether this entry has `url` and, when given, `name`
    pub fn matches(&self, url: &str, name: Option<&str>) -> bool {
        self.url == url && (name.is_none() || name == Some(self.name.as_str()))
    }

    /// Title shown to remote peers: file name first, tag title second
    pub fn display_title(&self) -> &str {
        if self.name.is_empty() {
            &self.title
        } else {
            &self.name
        }
    }

    /// Artist shown to remote peers
    pub fn display_artist(&self) -> &str {
        if self.artist.is_empty() {
            UNKNOWN_ARTIST
        } else {
            &self.artist
        }
    }
}

/// Named, ordered list of tracks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Playlist {
    /// Playlist name (unique within a catalog)
    pub name: String,

    /// Tracks in playback order
    pub music_list: Vec<Track>,
}

impl Playlist {
    /// Create a playlist
    pub fn new(name: impl Into<String>, music_list: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            music_list,
        }
    }
}
