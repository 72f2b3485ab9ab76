//! Headless audio backend
//!
//! The server has no sound output of its own: the phone or browser that
//! actually plays the file follows the broadcast snapshot. This backend
//! stands in for the audio element with a clock. While playing, a tokio
//! interval advances the position by `tick * rate` and reports progress;
//! reaching the duration reports `Ended`. Sources the lookup cannot resolve
//! report `Error` on play.

use lyre_core::Catalog;
use lyre_playback::{AudioBackend, AudioResource, Generation, ResourceEvent, ResourceListener};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Resolves a source URL to its duration in seconds
///
/// `None` marks the source unplayable; `Some(d)` with `d <= 0` plays with
/// an unknown duration.
pub type DurationLookup = Arc<dyn Fn(&str) -> Option<f64> + Send + Sync>;

/// Duration lookup backed by the catalog's track metadata
///
/// Runs on the session loop; pass an in-memory catalog such as
/// `LibraryCatalog`, never one that reads files per query.
pub fn catalog_durations(catalog: Arc<dyn Catalog>) -> DurationLookup {
    Arc::new(move |url| match catalog.find_track(url, None) {
        Ok(track) => track.map(|t| t.duration),
        Err(e) => {
            tracing::warn!("Catalog lookup for {} failed: {}", url, e);
            None
        }
    })
}

pub struct HeadlessBackend {
    tick: Duration,
    durations: DurationLookup,
}

impl HeadlessBackend {
    pub fn new(tick: Duration, durations: DurationLookup) -> Self {
        Self { tick, durations }
    }
}

impl AudioBackend for HeadlessBackend {
    fn create(&self) -> Box<dyn AudioResource> {
        Box::new(HeadlessResource::new(self.tick, Arc::clone(&self.durations)))
    }
}

#[derive(Debug, Default)]
struct Clock {
    source: Option<String>,
    generation: Generation,
    /// `None` when the lookup rejected the source
    duration: Option<f64>,
    position: f64,
    rate: f64,
    playing: bool,
}

impl Clock {
    fn known_duration(&self) -> Option<f64> {
        self.duration.filter(|d| *d > 0.0)
    }

    /// Advance by one tick, returning the event to report
    fn advance(&mut self, elapsed: f64) -> Option<(Generation, ResourceEvent)> {
        if !self.playing || self.source.is_none() {
            return None;
        }

        self.position += elapsed * self.rate;
        let event = match self.known_duration() {
            Some(duration) if self.position >= duration => {
                self.position = duration;
                self.playing = false;
                ResourceEvent::Ended
            }
            _ => ResourceEvent::Progress {
                position: self.position,
            },
        };
        Some((self.generation, event))
    }
}

/// Clock-driven stand-in for an audio element
pub struct HeadlessResource {
    tick: Duration,
    durations: DurationLookup,
    clock: Arc<Mutex<Clock>>,
    listener: Option<ResourceListener>,
    ticker: Option<JoinHandle<()>>,
}

impl HeadlessResource {
    fn new(tick: Duration, durations: DurationLookup) -> Self {
        Self {
            tick,
            durations,
            clock: Arc::new(Mutex::new(Clock {
                rate: 1.0,
                ..Default::default()
            })),
            listener: None,
            ticker: None,
        }
    }

    fn clock(&self) -> std::sync::MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, generation: Generation, event: ResourceEvent) {
        if let Some(listener) = &self.listener {
            listener(generation, event);
        }
    }

    fn start_ticker(&mut self, listener: ResourceListener) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, headless clock will not advance");
            return;
        };

        let clock = Arc::clone(&self.clock);
        let tick = self.tick;
        self.ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let event = clock
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .advance(tick.as_secs_f64());
                if let Some((generation, event)) = event {
                    listener(generation, event);
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl AudioResource for HeadlessResource {
    fn set_source(&mut self, url: Option<&str>, generation: Generation) {
        let duration = url.and_then(|url| (self.durations)(url));
        let mut clock = self.clock();
        clock.source = url.map(str::to_string);
        clock.generation = generation;
        clock.duration = duration;
        clock.position = 0.0;
        clock.playing = false;
    }

    fn play(&mut self) {
        let unplayable = {
            let mut clock = self.clock();
            let Some(source) = clock.source.clone() else {
                return;
            };
            if clock.duration.is_none() {
                Some((clock.generation, source))
            } else {
                clock.playing = true;
                None
            }
        };

        if let Some((generation, source)) = unplayable {
            self.emit(
                generation,
                ResourceEvent::Error(format!("cannot play {}", source)),
            );
        }
    }

    fn pause(&mut self) {
        self.clock().playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        let mut clock = self.clock();
        let upper = clock.known_duration().unwrap_or(f64::INFINITY);
        clock.position = seconds.clamp(0.0, upper);
    }

    fn set_volume(&mut self, _volume: f64) {}

    fn set_playback_rate(&mut self, rate: f64) {
        self.clock().rate = rate;
    }

    fn duration(&self) -> f64 {
        self.clock().known_duration().unwrap_or(f64::NAN)
    }

    fn current_time(&self) -> f64 {
        self.clock().position
    }

    fn attach(&mut self, listener: ResourceListener) {
        self.stop_ticker();
        self.listener = Some(Arc::clone(&listener));
        self.start_ticker(listener);
    }

    fn detach(&mut self) {
        self.stop_ticker();
        self.listener = None;
    }
}

impl Drop for HeadlessResource {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn resource_with(duration: Option<f64>) -> HeadlessResource {
        let durations: DurationLookup = Arc::new(move |_| duration);
        HeadlessResource::new(Duration::from_millis(250), durations)
    }

    fn channel_listener() -> (
        ResourceListener,
        mpsc::UnboundedReceiver<(Generation, ResourceEvent)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener: ResourceListener = Arc::new(move |generation, event| {
            let _ = tx.send((generation, event));
        });
        (listener, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn clock_reports_progress_then_ended() {
        let mut resource = resource_with(Some(1.0));
        let (listener, mut events) = channel_listener();
        resource.attach(listener);
        resource.set_source(Some("/music/a.mp3"), 3);
        resource.play();

        let mut received = Vec::new();
        for _ in 0..4 {
            received.push(events.recv().await.unwrap());
        }

        assert_eq!(
            received,
            vec![
                (3, ResourceEvent::Progress { position: 0.25 }),
                (3, ResourceEvent::Progress { position: 0.5 }),
                (3, ResourceEvent::Progress { position: 0.75 }),
                (3, ResourceEvent::Ended),
            ]
        );
        assert_eq!(resource.current_time(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn unplayable_source_reports_error() {
        let mut resource = resource_with(None);
        let (listener, mut events) = channel_listener();
        resource.attach(listener);
        resource.set_source(Some("/music/missing.mp3"), 1);
        resource.play();

        assert!(matches!(
            events.recv().await,
            Some((1, ResourceEvent::Error(message))) if message.contains("missing.mp3")
        ));
        assert!(resource.duration().is_nan());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_clock_does_not_advance() {
        let mut resource = resource_with(Some(10.0));
        let (listener, mut events) = channel_listener();
        resource.attach(listener);
        resource.set_source(Some("/music/a.mp3"), 1);
        resource.seek(4.0);

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(events.try_recv().is_err());
        assert_eq!(resource.current_time(), 4.0);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_stops_reporting() {
        let mut resource = resource_with(Some(10.0));
        let (listener, mut events) = channel_listener();
        resource.attach(listener);
        resource.set_source(Some("/music/a.mp3"), 1);
        resource.play();
        resource.detach();

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn events_carry_the_generation_of_the_playing_source() {
        let mut resource = resource_with(Some(10.0));
        let (listener, mut events) = channel_listener();
        resource.attach(listener);
        resource.set_source(Some("/music/a.mp3"), 1);
        resource.play();
        assert_eq!(events.recv().await.unwrap().0, 1);

        resource.pause();
        resource.set_source(Some("/music/b.mp3"), 2);
        resource.play();
        assert_eq!(
            events.recv().await.unwrap(),
            (2, ResourceEvent::Progress { position: 0.25 })
        );
    }

    #[test]
    fn seek_is_clamped_to_duration() {
        let mut resource = resource_with(Some(30.0));
        resource.set_source(Some("/music/a.mp3"), 1);

        resource.seek(45.0);
        assert_eq!(resource.current_time(), 30.0);

        resource.seek(-3.0);
        assert_eq!(resource.current_time(), 0.0);
    }
}
