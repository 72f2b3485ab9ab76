//! Playback engine - the session state machine
//!
//! Sole authority over `PlaybackSession`. Every operation leaves the session
//! consistent, commits it through the persistence adapter, and queues the
//! events the host fans out to peers.

use crate::{
    events::PlaybackEvent,
    favorites::Favorites,
    history::History,
    persistence::{KeyValueStore, Persistence, WriteKind},
    resource::{
        AudioBackend, Generation, OutputSettings, ResourceEvent, ResourceLifecycle,
        ResourceListener,
    },
    types::{Direction, PlayMode, PlaybackConfig, PlaybackSession, SessionStatus, StatusSnapshot},
};
use lyre_core::{types::UNKNOWN_ARTIST, Track};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

/// Central playback state machine
///
/// Not thread-safe by itself: the host owns it from a single loop and
/// serializes every command, resource event, and status query onto it.
pub struct PlaybackEngine {
    session: PlaybackSession,
    history: History,
    resource: ResourceLifecycle,
    persistence: Persistence,
    favorites: Favorites,
    rng: Box<dyn RngCore + Send>,

    // Resource faults since the last progress report
    consecutive_failures: usize,

    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Create the engine from the last persisted state
    ///
    /// A restored track is loaded into a fresh resource and positioned at the
    /// saved time, but not played.
    pub fn new(
        config: PlaybackConfig,
        backend: Box<dyn AudioBackend>,
        listener: ResourceListener,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let persistence = Persistence::new(store, config.persist_interval);
        let restored = persistence.load();

        let mut engine = Self {
            session: restored.session,
            history: History::new(config.history_capacity),
            resource: ResourceLifecycle::new(backend, listener),
            persistence,
            favorites: restored.favorites,
            rng: Box::new(StdRng::from_entropy()),
            consecutive_failures: 0,
            pending_events: Vec::new(),
        };
        engine.prepare_restored();
        engine
    }

    /// Replace the random source (deterministic shuffles in tests)
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    fn prepare_restored(&mut self) {
        let Some(track) = self.session.current_track.clone() else {
            return;
        };

        tracing::info!(
            "Restored session: {} ({}/{}) at {:.1}s",
            track.display_title(),
            self.session.current_index + 1,
            self.session.playlist.len(),
            self.session.elapsed_seconds
        );

        let settings = self.output_settings();
        let resource = self.resource.acquire(Some(&track.url), settings);
        if self.session.elapsed_seconds > 0.0 {
            resource.seek(self.session.elapsed_seconds);
        }
    }

    // ===== Track Loading =====

    /// Load `playlist` and start `track` from the beginning
    ///
    /// No-op when the playlist is empty or does not contain the track.
    pub fn load_and_play(&mut self, track: Track, playlist: Vec<Track>) {
        if playlist.is_empty() {
            tracing::debug!("load_and_play with empty playlist ignored");
            return;
        }

        let Some(index) = playlist.iter().position(|t| t.same_entry(&track)) else {
            tracing::debug!("Track {} is not in the given playlist", track.url);
            return;
        };

        self.session.playlist = playlist;
        self.start_track(index);
    }

    fn start_track(&mut self, index: usize) {
        let track = self.session.playlist[index].clone();

        self.session.current_index = index;
        self.session.elapsed_seconds = 0.0;
        self.session.is_playing = true;

        let settings = self.output_settings();
        self.resource.swap(&track.url, settings);

        tracing::debug!("Playing {} ({})", track.display_title(), index);
        self.pending_events.push(PlaybackEvent::TrackChanged {
            url: track.url.clone(),
        });
        self.session.current_track = Some(track);

        self.commit(WriteKind::Immediate);
    }

    // ===== Playback Control =====

    /// Start or resume playback
    pub fn play(&mut self) {
        let Some(resource) = self.resource.get_mut() else {
            return;
        };
        if self.session.is_playing {
            return;
        }

        resource.play();
        self.session.is_playing = true;
        self.commit(WriteKind::Immediate);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        let Some(resource) = self.resource.get_mut() else {
            return;
        };
        if !self.session.is_playing {
            return;
        }

        resource.pause();
        self.session.is_playing = false;
        self.commit(WriteKind::Immediate);
    }

    /// Toggle between playing and paused
    pub fn toggle(&mut self) {
        if !self.resource.is_acquired() {
            return;
        }

        if self.session.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    // ===== Seek =====

    /// Seek to an absolute position in seconds
    ///
    /// Clamping to the track length is left to the resource.
    pub fn seek(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let Some(resource) = self.resource.get_mut() else {
            return;
        };

        resource.seek(seconds);
        self.session.elapsed_seconds = seconds;
        self.commit(WriteKind::Immediate);
    }

    /// Seek to a fraction in [0, 1] of the current track
    ///
    /// Dropped when the fraction is out of range or the duration is unknown.
    pub fn seek_fraction(&mut self, fraction: f64) {
        if !(0.0..=1.0).contains(&fraction) {
            tracing::debug!("Seek fraction {} out of range, dropped", fraction);
            return;
        }
        let Some(duration) = self.resource.duration() else {
            tracing::debug!("Seek dropped, duration unknown");
            return;
        };

        self.seek(fraction * duration);
    }

    // ===== Output =====

    /// Set volume, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);

        self.session.volume = volume;
        if let Some(resource) = self.resource.get_mut() {
            resource.set_volume(volume);
        }
        self.persistence.save_volume(volume);
        self.pending_events.push(PlaybackEvent::StatusChanged);
    }

    /// Set playback rate; non-positive rates are ignored
    pub fn set_playback_rate(&mut self, rate: f64) {
        if !(rate.is_finite() && rate > 0.0) {
            return;
        }

        self.session.playback_rate = rate;
        if let Some(resource) = self.resource.get_mut() {
            resource.set_playback_rate(rate);
        }
        self.pending_events.push(PlaybackEvent::StatusChanged);
    }

    // ===== Modes & Traversal =====

    /// Set the play mode; the current position is untouched
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.session.mode = mode;
        self.commit(WriteKind::Immediate);
    }

    /// Move to the next or previous track according to the play mode
    ///
    /// No-op on an empty playlist.
    pub fn advance(&mut self, direction: Direction) {
        let len = self.session.playlist.len();
        if len == 0 {
            return;
        }

        let target = match self.session.mode {
            PlayMode::Loop => {
                self.restart_current();
                return;
            }
            PlayMode::Sequence => {
                let current = self.session.current_index.min(len - 1) as isize;
                let target = (current + direction.step()).rem_euclid(len as isize) as usize;
                self.history.record(target);
                target
            }
            PlayMode::Random => {
                let replay = match direction {
                    Direction::Next => self.history.step_forward(),
                    Direction::Previous => self.history.step_backward(),
                };
                match replay {
                    Some(index) if index < len => index,
                    _ => {
                        let pick = self.pick_random();
                        self.history.record(pick);
                        pick
                    }
                }
            }
        };

        self.start_track(target);
    }

    /// Uniform pick excluding the current index (when there is a choice)
    fn pick_random(&mut self) -> usize {
        let len = self.session.playlist.len();
        if len <= 1 {
            return 0;
        }

        let current = self.session.current_index.min(len - 1);
        let pick = self.rng.gen_range(0..len - 1);
        if pick >= current {
            pick + 1
        } else {
            pick
        }
    }

    fn restart_current(&mut self) {
        self.session.elapsed_seconds = 0.0;

        let Some(resource) = self.resource.get_mut() else {
            // Nothing loaded yet: load the track under the cursor
            let index = self.session.current_index.min(self.session.playlist.len() - 1);
            self.start_track(index);
            return;
        };

        resource.seek(0.0);
        if !self.session.is_playing {
            resource.play();
            self.session.is_playing = true;
        }
        self.commit(WriteKind::Immediate);
    }

    // ===== Resource Events =====

    /// Apply a fact reported by the audio resource
    ///
    /// Events for a source other than the current one (queued before a swap
    /// or a release) are ignored. A resource error is treated like the end of
    /// the track so playback never gets stuck on unplayable media; after one
    /// failure per playlist entry without progress in between, playback
    /// pauses instead.
    pub fn on_resource_event(&mut self, generation: Generation, event: ResourceEvent) {
        if self.resource.generation() != Some(generation) {
            tracing::trace!("Dropping stale resource event {:?}", event);
            return;
        }

        match event {
            ResourceEvent::Progress { position } => {
                if !position.is_finite() {
                    return;
                }
                self.consecutive_failures = 0;
                self.session.elapsed_seconds = position.max(0.0);
                self.commit(WriteKind::Progress);
            }
            ResourceEvent::Ended => {
                // The resource has stopped itself
                self.session.is_playing = false;
                self.advance(Direction::Next);
            }
            ResourceEvent::Error(message) => {
                self.consecutive_failures += 1;
                let limit = self.session.playlist.len().max(1);

                if self.consecutive_failures >= limit {
                    tracing::warn!(
                        "Audio resource failed {} times in a row ({}), pausing",
                        self.consecutive_failures,
                        message
                    );
                    self.consecutive_failures = 0;
                    self.pause();
                    return;
                }

                tracing::warn!("Audio resource error ({}), skipping track", message);
                self.session.is_playing = false;
                self.advance(Direction::Next);
            }
        }
    }

    // ===== Favorites =====

    /// Add a favorite; returns `false` if already present
    pub fn add_favorite(&mut self, track: Track) -> bool {
        let changed = self.favorites.add(track);
        if changed {
            self.favorites_changed();
        }
        changed
    }

    /// Remove a favorite; returns `false` if absent
    pub fn remove_favorite(&mut self, track: &Track) -> bool {
        let changed = self.favorites.remove(track);
        if changed {
            self.favorites_changed();
        }
        changed
    }

    /// Flip favorite membership; returns the new membership
    pub fn toggle_favorite(&mut self, track: Track) -> bool {
        let favorite = self.favorites.toggle(track);
        self.favorites_changed();
        favorite
    }

    pub fn is_favorite(&self, track: &Track) -> bool {
        self.favorites.contains(track)
    }

    fn favorites_changed(&mut self) {
        self.persistence.save_favorites(&self.favorites);
        self.pending_events.push(PlaybackEvent::FavoritesChanged {
            count: self.favorites.len(),
        });
    }

    // ===== Lifecycle =====

    /// Release the resource and return to an empty session
    ///
    /// Favorites are kept; they are not part of the session.
    pub fn reset(&mut self) {
        self.resource.release();
        self.session = PlaybackSession::default();
        self.history.clear();
        self.consecutive_failures = 0;
        self.pending_events.push(PlaybackEvent::StatusChanged);
        tracing::info!("Playback session reset");
    }

    // ===== State Queries =====

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    /// Duration of the loaded source, `None` when unknown
    pub fn duration(&self) -> Option<f64> {
        self.resource.duration()
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_acquired()
    }

    /// Generation of the loaded source, `None` without a resource
    pub fn source_generation(&self) -> Option<Generation> {
        self.resource.generation()
    }

    /// Snapshot broadcast to remote peers
    pub fn snapshot(&self) -> StatusSnapshot {
        let track = self.session.current_track.as_ref();
        StatusSnapshot {
            title: track.map(|t| t.display_title().to_string()),
            artist: track
                .map_or(UNKNOWN_ARTIST, |t| t.display_artist())
                .to_string(),
            is_playing: self.session.is_playing,
            volume: self.session.volume,
            mode: self.session.mode,
            current_time: self.session.elapsed_seconds,
            duration: self.duration().unwrap_or(0.0),
            cover_ref: track.map(|t| t.cover.clone()).filter(|c| !c.is_empty()),
            url: track.map(|t| t.url.clone()),
        }
    }

    /// Full status for the host UI
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            snapshot: self.snapshot(),
            playback_rate: self.session.playback_rate,
            index: self.session.current_index,
            playlist_length: self.session.playlist.len(),
            favorite: self
                .session
                .current_track
                .as_ref()
                .is_some_and(|t| self.favorites.contains(t)),
        }
    }

    // ===== Events =====

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            volume: self.session.volume,
            playback_rate: self.session.playback_rate,
        }
    }

    fn commit(&mut self, kind: WriteKind) {
        if self.persistence.schedule(&self.session, kind, Instant::now()) {
            self.pending_events.push(PlaybackEvent::StatusChanged);
        }
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("session", &self.session)
            .field("history", &self.history)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
