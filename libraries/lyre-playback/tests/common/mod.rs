//! Shared test harness: a recording fake audio backend

#![allow(dead_code)]

use lyre_core::Track;
use lyre_playback::{
    AudioBackend, AudioResource, Generation, MemoryStore, PlaybackConfig, PlaybackEngine,
    ResourceEvent, ResourceListener,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything the fake resources did, shared with the test
#[derive(Debug, Default)]
pub struct Recording {
    pub calls: Vec<String>,
    pub source: Option<String>,
    /// Generation of the last assigned source
    pub generation: Generation,
    pub position: f64,
    pub volume: f64,
    pub rate: f64,
    pub playing: bool,
    pub created: usize,
    pub attached: usize,
    /// Duration reported for any source; 0 means unknown
    pub duration: f64,
}

pub type SharedRecording = Arc<Mutex<Recording>>;

pub struct FakeResource {
    recording: SharedRecording,
}

impl FakeResource {
    fn log(&self, call: String) {
        self.recording.lock().unwrap().calls.push(call);
    }
}

impl AudioResource for FakeResource {
    fn set_source(&mut self, url: Option<&str>, generation: Generation) {
        self.log(format!("source:{}", url.unwrap_or("-")));
        let mut rec = self.recording.lock().unwrap();
        rec.source = url.map(str::to_string);
        rec.generation = generation;
        rec.position = 0.0;
        rec.playing = false;
    }

    fn play(&mut self) {
        self.log("play".into());
        self.recording.lock().unwrap().playing = true;
    }

    fn pause(&mut self) {
        self.log("pause".into());
        self.recording.lock().unwrap().playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        self.log(format!("seek:{seconds}"));
        self.recording.lock().unwrap().position = seconds;
    }

    fn set_volume(&mut self, volume: f64) {
        self.recording.lock().unwrap().volume = volume;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.recording.lock().unwrap().rate = rate;
    }

    fn duration(&self) -> f64 {
        let rec = self.recording.lock().unwrap();
        if rec.source.is_some() {
            rec.duration
        } else {
            f64::NAN
        }
    }

    fn current_time(&self) -> f64 {
        self.recording.lock().unwrap().position
    }

    fn attach(&mut self, _listener: ResourceListener) {
        self.recording.lock().unwrap().attached += 1;
    }

    fn detach(&mut self) {
        let mut rec = self.recording.lock().unwrap();
        rec.attached -= 1;
        rec.calls.push("detach".into());
    }
}

pub struct FakeBackend {
    recording: SharedRecording,
}

impl AudioBackend for FakeBackend {
    fn create(&self) -> Box<dyn AudioResource> {
        self.recording.lock().unwrap().created += 1;
        Box::new(FakeResource {
            recording: Arc::clone(&self.recording),
        })
    }
}

/// Engine wired to a fake backend and an in-memory store
pub struct Harness {
    pub engine: PlaybackEngine,
    pub recording: SharedRecording,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let recording: SharedRecording = Arc::new(Mutex::new(Recording {
            duration: 200.0,
            ..Default::default()
        }));
        let backend = FakeBackend {
            recording: Arc::clone(&recording),
        };
        let listener: ResourceListener = Arc::new(|_, _| {});
        let config = PlaybackConfig {
            history_capacity: 100,
            persist_interval: Duration::from_secs(1),
        };

        let engine = PlaybackEngine::new(config, Box::new(backend), listener, store.clone())
            .with_rng(StdRng::seed_from_u64(7));

        Self {
            engine,
            recording,
            store,
        }
    }

    /// Load `playlist` and start the track at `index`
    pub fn start(&mut self, playlist: &[Track], index: usize) {
        self.engine
            .load_and_play(playlist[index].clone(), playlist.to_vec());
        self.engine.drain_events();
    }

    pub fn current_url(&self) -> Option<String> {
        self.engine
            .session()
            .current_track
            .as_ref()
            .map(|t| t.url.clone())
    }

    pub fn set_duration(&self, seconds: f64) {
        self.recording.lock().unwrap().duration = seconds;
    }

    pub fn calls(&self) -> Vec<String> {
        self.recording.lock().unwrap().calls.clone()
    }

    /// Generation the fake resource stamps on its events
    pub fn generation(&self) -> Generation {
        self.recording.lock().unwrap().generation
    }

    /// Report an event for the source the fake currently holds
    pub fn emit(&mut self, event: ResourceEvent) {
        let generation = self.generation();
        self.engine.on_resource_event(generation, event);
    }

    /// The source plays to its end; like a real element the fake stops first
    pub fn ended(&mut self) {
        {
            let mut rec = self.recording.lock().unwrap();
            rec.playing = false;
            rec.position = rec.duration;
        }
        self.emit(ResourceEvent::Ended);
    }

    /// The source fails; the fake stops before reporting it
    pub fn fail(&mut self, message: &str) {
        self.recording.lock().unwrap().playing = false;
        self.emit(ResourceEvent::Error(message.to_string()));
    }

    pub fn is_resource_playing(&self) -> bool {
        self.recording.lock().unwrap().playing
    }
}

/// Playlist of `n` tracks named t0, t1, ...
pub fn playlist(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| {
            let mut track = Track::new(format!("/music/t{i}.mp3"), format!("t{i}.mp3"));
            track.artist = format!("Artist {i}");
            track.duration = 200.0;
            track
        })
        .collect()
}
