//! Playback Events
//!
//! The engine queues these while it mutates the session; the host drains
//! them after each operation and fans the results out (broadcast, UI).

use serde::{Deserialize, Serialize};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Observable status changed; peers should receive a fresh snapshot
    StatusChanged,

    /// A different track was loaded
    TrackChanged {
        /// URL of the new track
        url: String,
    },

    /// Favorites set changed
    FavoritesChanged {
        /// Number of favorites after the change
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_variant_names() {
        let json = serde_json::to_string(&PlaybackEvent::TrackChanged {
            url: "/music/a.mp3".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"TrackChanged":{"url":"/music/a.mp3"}}"#);
    }
}
