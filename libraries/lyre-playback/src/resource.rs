//! Audio resource lifecycle
//!
//! Lyre does not decode audio. The host supplies an `AudioBackend` that
//! creates playback resources (an HTML audio element, a native player, a
//! headless clock). `ResourceLifecycle` owns at most one of them and makes
//! sure its listener is attached exactly once and detached on release.

use std::fmt;
use std::sync::Arc;

/// Facts a resource reports upward
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Periodic time update
    Progress {
        /// Seconds into the current source
        position: f64,
    },

    /// The current source played to its end
    Ended,

    /// The source could not be played
    Error(String),
}

/// Identifies one assignment of a source to the resource
///
/// Every event carries the generation of the source it describes, so an
/// event queued before a swap cannot be applied to the next track.
pub type Generation = u64;

/// Callback receiving resource events
///
/// One stable instance is created by the host and reused for every resource,
/// so detaching never has to identify "which" closure to remove.
pub type ResourceListener = Arc<dyn Fn(Generation, ResourceEvent) + Send + Sync>;

/// External audio playback primitive
///
/// Implementors perform the actual decoding/output. All methods are
/// fire-and-forget; faults are reported through the attached listener.
pub trait AudioResource: Send {
    /// Assign a new source, or clear it with `None`
    ///
    /// Events reported for this source must carry `generation`.
    fn set_source(&mut self, url: Option<&str>, generation: Generation);

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Jump to a position in seconds
    fn seek(&mut self, seconds: f64);

    /// Set output volume in [0, 1]
    fn set_volume(&mut self, volume: f64);

    /// Set playback rate (> 0)
    fn set_playback_rate(&mut self, rate: f64);

    /// Duration of the current source in seconds (<= 0 or NaN when unknown)
    fn duration(&self) -> f64;

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Register the listener for progress/ended/error events
    fn attach(&mut self, listener: ResourceListener);

    /// Remove the listener
    fn detach(&mut self);
}

/// Factory for playback resources
pub trait AudioBackend: Send {
    /// Create a fresh resource with no source and no listener
    fn create(&self) -> Box<dyn AudioResource>;
}

/// Output settings applied to a newly acquired resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSettings {
    pub volume: f64,
    pub playback_rate: f64,
}

/// Owner of the single playback resource
///
/// Transitions are explicit: idle to acquired on `acquire`/`swap`, back to
/// idle on `release`.
pub struct ResourceLifecycle {
    backend: Box<dyn AudioBackend>,
    listener: ResourceListener,
    slot: Option<Box<dyn AudioResource>>,
    generation: Generation,
}

impl ResourceLifecycle {
    /// Create an idle lifecycle
    pub fn new(backend: Box<dyn AudioBackend>, listener: ResourceListener) -> Self {
        Self {
            backend,
            listener,
            slot: None,
            generation: 0,
        }
    }

    /// Create the resource if absent and point it at `initial_url`
    ///
    /// Does not start playback. An already acquired resource is returned
    /// untouched.
    pub fn acquire(
        &mut self,
        initial_url: Option<&str>,
        settings: OutputSettings,
    ) -> &mut dyn AudioResource {
        let backend = &self.backend;
        let listener = &self.listener;
        let generation = &mut self.generation;
        self.slot
            .get_or_insert_with(|| {
                *generation += 1;
                let mut resource = backend.create();
                resource.set_volume(settings.volume);
                resource.set_playback_rate(settings.playback_rate);
                resource.set_source(initial_url, *generation);
                resource.attach(Arc::clone(listener));
                tracing::debug!("Audio resource acquired");
                resource
            })
            .as_mut()
    }

    /// Replace the current source with `url` and start playback
    ///
    /// Behaves like `acquire` followed by `play` when no resource exists.
    pub fn swap(&mut self, url: &str, settings: OutputSettings) {
        if let Some(resource) = self.slot.as_mut() {
            self.generation += 1;
            resource.pause();
            resource.seek(0.0);
            resource.set_source(None, self.generation);
            resource.set_source(Some(url), self.generation);
            resource.play();
            return;
        }

        self.acquire(Some(url), settings).play();
    }

    /// Pause, detach, and drop the resource
    pub fn release(&mut self) {
        if let Some(mut resource) = self.slot.take() {
            resource.pause();
            resource.detach();
            resource.set_source(None, self.generation);
            tracing::debug!("Audio resource released");
        }
    }

    /// Borrow the live resource
    pub fn get(&self) -> Option<&dyn AudioResource> {
        self.slot.as_deref()
    }

    /// Mutably borrow the live resource
    pub fn get_mut(&mut self) -> Option<&mut dyn AudioResource> {
        match self.slot.as_mut() {
            Some(resource) => Some(resource.as_mut()),
            None => None,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.slot.is_some()
    }

    /// Generation of the current source, `None` when idle
    pub fn generation(&self) -> Option<Generation> {
        self.slot.as_ref().map(|_| self.generation)
    }

    /// Duration reported by the resource, `None` when unknown
    pub fn duration(&self) -> Option<f64> {
        self.get()
            .map(|r| r.duration())
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

impl fmt::Debug for ResourceLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLifecycle")
            .field("acquired", &self.is_acquired())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
        attached: usize,
        created: usize,
    }

    struct LoggingResource {
        log: Arc<Mutex<Log>>,
    }

    impl AudioResource for LoggingResource {
        fn set_source(&mut self, url: Option<&str>, _generation: Generation) {
            self.log
                .lock()
                .unwrap()
                .calls
                .push(format!("source:{}", url.unwrap_or("-")));
        }
        fn play(&mut self) {
            self.log.lock().unwrap().calls.push("play".into());
        }
        fn pause(&mut self) {
            self.log.lock().unwrap().calls.push("pause".into());
        }
        fn seek(&mut self, seconds: f64) {
            self.log.lock().unwrap().calls.push(format!("seek:{}", seconds));
        }
        fn set_volume(&mut self, _volume: f64) {}
        fn set_playback_rate(&mut self, _rate: f64) {}
        fn duration(&self) -> f64 {
            120.0
        }
        fn current_time(&self) -> f64 {
            0.0
        }
        fn attach(&mut self, _listener: ResourceListener) {
            self.log.lock().unwrap().attached += 1;
        }
        fn detach(&mut self) {
            let mut log = self.log.lock().unwrap();
            log.attached -= 1;
            log.calls.push("detach".into());
        }
    }

    struct LoggingBackend {
        log: Arc<Mutex<Log>>,
    }

    impl AudioBackend for LoggingBackend {
        fn create(&self) -> Box<dyn AudioResource> {
            self.log.lock().unwrap().created += 1;
            Box::new(LoggingResource {
                log: Arc::clone(&self.log),
            })
        }
    }

    fn lifecycle() -> (ResourceLifecycle, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let backend = LoggingBackend {
            log: Arc::clone(&log),
        };
        let listener: ResourceListener = Arc::new(|_, _| {});
        (ResourceLifecycle::new(Box::new(backend), listener), log)
    }

    const SETTINGS: OutputSettings = OutputSettings {
        volume: 1.0,
        playback_rate: 1.0,
    };

    #[test]
    fn acquire_is_idempotent() {
        let (mut lifecycle, log) = lifecycle();
        lifecycle.acquire(Some("a"), SETTINGS);
        lifecycle.acquire(Some("b"), SETTINGS);

        let log = log.lock().unwrap();
        assert_eq!(log.created, 1);
        assert_eq!(log.attached, 1);
        assert_eq!(log.calls, vec!["source:a"]);
    }

    #[test]
    fn swap_reuses_resource_without_reattaching() {
        let (mut lifecycle, log) = lifecycle();
        lifecycle.swap("a", SETTINGS);
        lifecycle.swap("b", SETTINGS);

        let log = log.lock().unwrap();
        assert_eq!(log.created, 1);
        assert_eq!(log.attached, 1);
        assert_eq!(
            log.calls,
            vec!["source:a", "play", "pause", "seek:0", "source:-", "source:b", "play"]
        );
    }

    #[test]
    fn release_detaches_and_returns_to_idle() {
        let (mut lifecycle, log) = lifecycle();
        lifecycle.swap("a", SETTINGS);
        lifecycle.release();

        assert!(!lifecycle.is_acquired());
        assert!(lifecycle.duration().is_none());
        let log = log.lock().unwrap();
        assert_eq!(log.attached, 0);
        assert!(log.calls.ends_with(&[
            "pause".to_string(),
            "detach".to_string(),
            "source:-".to_string()
        ]));
    }

    #[test]
    fn every_new_source_gets_a_new_generation() {
        let (mut lifecycle, _log) = lifecycle();
        assert_eq!(lifecycle.generation(), None);

        lifecycle.swap("a", SETTINGS);
        let first = lifecycle.generation().unwrap();
        lifecycle.swap("b", SETTINGS);
        let second = lifecycle.generation().unwrap();
        assert!(second > first);

        lifecycle.release();
        assert_eq!(lifecycle.generation(), None);
        lifecycle.acquire(Some("c"), SETTINGS);
        assert!(lifecycle.generation().unwrap() > second);
    }

    #[test]
    fn release_when_idle_is_a_no_op() {
        let (mut lifecycle, log) = lifecycle();
        lifecycle.release();
        assert_eq!(log.lock().unwrap().created, 0);
    }

    #[test]
    fn reacquire_after_release_creates_new_resource() {
        let (mut lifecycle, log) = lifecycle();
        lifecycle.swap("a", SETTINGS);
        lifecycle.release();
        lifecycle.swap("b", SETTINGS);

        let log = log.lock().unwrap();
        assert_eq!(log.created, 2);
        assert_eq!(log.attached, 1);
    }
}
