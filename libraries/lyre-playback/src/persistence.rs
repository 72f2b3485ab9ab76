//! Resumable state persistence
//!
//! Writes the session snapshot to a key/value store under stable keys. Two
//! write paths share one adapter: discrete user actions commit immediately,
//! time-progress updates pass through a timestamp gate.

use crate::error::Result;
use crate::favorites::Favorites;
use crate::types::{PlayMode, PlaybackSession};
use lyre_core::Track;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Key of the resumable session object
pub const CURRENT_KEY: &str = "current";

/// Key of the elapsed time of the current track
pub const CURRENT_TIME_KEY: &str = "current_time";

/// Key of the favorites array
pub const FAVORITES_KEY: &str = "favorites";

/// Key of the output volume
pub const VOLUME_KEY: &str = "volume";

/// Local key/value storage
///
/// Implementations should not block on disk: `set` is called from the
/// engine's loop and is expected to hand the write off.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    fn set(&self, key: &str, value: String) -> Result<()>;
}

/// Store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all stored values
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values
            .lock()
            .map(|values| values.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| crate::PlaybackError::Store(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| crate::PlaybackError::Store(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Which write path a commit takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Discrete user action: never throttled
    Immediate,

    /// Time progress: at most once per persist interval
    Progress,
}

/// Persisted form of the session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedSession {
    song: Option<Track>,
    play_list: Vec<Track>,
    index: usize,
    is_playing: bool,
    play_mode: PlayMode,
}

/// State recovered at startup
#[derive(Debug, Clone, Default)]
pub struct RestoredState {
    pub session: PlaybackSession,
    pub favorites: Favorites,
}

/// Persistence adapter
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
    interval: Duration,
    last_progress_write: Option<Instant>,
}

impl Persistence {
    /// Create an adapter over `store`
    pub fn new(store: Arc<dyn KeyValueStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            last_progress_write: None,
        }
    }

    /// Commit the session through the given write path
    ///
    /// Returns `false` when a progress write was held back by the gate.
    pub fn schedule(&mut self, session: &PlaybackSession, kind: WriteKind, now: Instant) -> bool {
        if kind == WriteKind::Progress {
            if let Some(last) = self.last_progress_write {
                if now.saturating_duration_since(last) < self.interval {
                    return false;
                }
            }
            self.last_progress_write = Some(now);
        }

        self.write_session(session);
        true
    }

    /// Persist the output volume
    pub fn save_volume(&self, volume: f64) {
        self.set(VOLUME_KEY, volume.to_string());
    }

    /// Persist the favorites set
    pub fn save_favorites(&self, favorites: &Favorites) {
        match serde_json::to_string(favorites.tracks()) {
            Ok(json) => self.set(FAVORITES_KEY, json),
            Err(e) => tracing::warn!("Failed to encode favorites: {}", e),
        }
    }

    /// Recover the last persisted state
    ///
    /// Anything missing or unreadable falls back to defaults.
    pub fn load(&self) -> RestoredState {
        let mut session = PlaybackSession::default();

        if let Some(saved) = self.restore_json::<PersistedSession>(CURRENT_KEY) {
            let resumable = saved.song.is_some() && saved.index < saved.play_list.len();
            if resumable {
                session.current_track = saved.song;
                session.playlist = saved.play_list;
                session.current_index = saved.index;
                session.mode = saved.play_mode;
                session.elapsed_seconds = self
                    .read_f64(CURRENT_TIME_KEY)
                    .filter(|t| *t >= 0.0)
                    .unwrap_or(0.0);
            } else {
                tracing::warn!("Ignoring persisted session without a playable position");
            }
        }

        if let Some(volume) = self.read_f64(VOLUME_KEY) {
            session.volume = volume.clamp(0.0, 1.0);
        }

        let favorites = self
            .restore_json::<Vec<Track>>(FAVORITES_KEY)
            .map(Favorites::from_tracks)
            .unwrap_or_default();

        RestoredState { session, favorites }
    }

    fn write_session(&self, session: &PlaybackSession) {
        let Some(song) = session.current_track.clone() else {
            tracing::debug!("Nothing loaded, skipping session write");
            return;
        };
        if session.playlist.is_empty() {
            tracing::debug!("Empty playlist, skipping session write");
            return;
        }

        self.set(CURRENT_TIME_KEY, session.elapsed_seconds.to_string());

        let persisted = PersistedSession {
            song: Some(song),
            play_list: session.playlist.clone(),
            index: session.current_index,
            is_playing: session.is_playing,
            play_mode: session.mode,
        };
        match serde_json::to_string(&persisted) {
            Ok(json) => self.set(CURRENT_KEY, json),
            Err(e) => tracing::warn!("Failed to encode session snapshot: {}", e),
        }
    }

    fn set(&self, key: &str, value: String) {
        // A failed write is retried implicitly by the next commit
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn read_f64(&self, key: &str) -> Option<f64> {
        self.read(key)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.read(key) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn restore_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read_json(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Discarding corrupt {} value: {}", key, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("interval", &self.interval)
            .field("last_progress_write", &self.last_progress_write)
            .finish_non_exhaustive()
    }
}
