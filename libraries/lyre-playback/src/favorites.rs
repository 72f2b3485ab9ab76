//! Favorite tracks
//!
//! Independent of the playback session: membership only changes through
//! explicit add/remove/toggle calls.

use lyre_core::Track;

/// Set of favorite tracks keyed by `url` + `name`, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Favorites {
    tracks: Vec<Track>,
}

impl Favorites {
    /// Build from persisted tracks, dropping duplicate entries
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let mut favorites = Self::default();
        for track in tracks {
            favorites.add(track);
        }
        favorites
    }

    /// Add a track; returns `false` if it was already present
    pub fn add(&mut self, track: Track) -> bool {
        if self.contains(&track) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Remove a track; returns `false` if it was not present
    pub fn remove(&mut self, track: &Track) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| !t.same_entry(track));
        self.tracks.len() != before
    }

    /// Flip membership; returns the new membership
    pub fn toggle(&mut self, track: Track) -> bool {
        if self.remove(&track) {
            false
        } else {
            self.tracks.push(track);
            true
        }
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.iter().any(|t| t.same_entry(track))
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
