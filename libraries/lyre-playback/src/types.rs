//! Core types for playback management

use lyre_core::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of entries kept in the shuffle history
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Minimum spacing between snapshot writes caused by time progress
pub const DEFAULT_PERSIST_INTERVAL: Duration = Duration::from_secs(1);

/// Play mode, governs what `advance` does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Playlist order, wrapping at both ends
    #[default]
    Sequence,

    /// History-aware random pick
    Random,

    /// Repeat the current track
    Loop,
}

impl PlayMode {
    /// Parse the wire name of a mode
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sequence" => Some(Self::Sequence),
            "random" => Some(Self::Random),
            "loop" => Some(Self::Loop),
            _ => None,
        }
    }

    /// Wire name of the mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Random => "random",
            Self::Loop => "loop",
        }
    }
}

/// Traversal direction for `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the next track
    Next,

    /// Towards the previous track
    Previous,
}

impl Direction {
    /// Signed step used by sequence traversal
    pub fn step(self) -> isize {
        match self {
            Self::Next => 1,
            Self::Previous => -1,
        }
    }
}

/// The single authoritative playback state
///
/// Owned by `PlaybackEngine`; everyone else sees it through `&` borrows or
/// the snapshot types below.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    /// Loaded track, `None` when nothing is loaded
    pub current_track: Option<Track>,

    /// Tracks in sequence order
    pub playlist: Vec<Track>,

    /// Position of `current_track` in `playlist` (ignored when empty)
    pub current_index: usize,

    /// Active play mode
    pub mode: PlayMode,

    /// Seconds into the current track
    pub elapsed_seconds: f64,

    /// Output volume in [0, 1]
    pub volume: f64,

    /// Playback rate, always > 0
    pub playback_rate: f64,

    /// Whether the resource is playing
    pub is_playing: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current_track: None,
            playlist: Vec::new(),
            current_index: 0,
            mode: PlayMode::Sequence,
            elapsed_seconds: 0.0,
            volume: 1.0,
            playback_rate: 1.0,
            is_playing: false,
        }
    }
}

/// Status snapshot broadcast to remote peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub title: Option<String>,
    pub artist: String,
    pub is_playing: bool,
    pub volume: f64,
    pub mode: PlayMode,
    pub current_time: f64,
    pub duration: f64,
    pub cover_ref: Option<String>,
    pub url: Option<String>,
}

/// Full status returned to the host for UI rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// What remote peers see
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,

    /// Current playback rate
    pub playback_rate: f64,

    /// Index into the playlist
    pub index: usize,

    /// Playlist length
    pub playlist_length: usize,

    /// Whether the current track is a favorite
    pub favorite: bool,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Maximum shuffle history size (default: 100)
    pub history_capacity: usize,

    /// Minimum spacing of progress-driven writes (default: 1s)
    pub persist_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            persist_interval: DEFAULT_PERSIST_INTERVAL,
        }
    }
}
