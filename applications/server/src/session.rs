//! Serialized playback session loop
//!
//! One tokio task owns the `PlaybackEngine`. Remote commands, host requests,
//! resource events, and status queries all arrive on one channel and are
//! applied in receipt order. After each input the loop drains the engine's
//! events and broadcasts at most one snapshot, taken after the mutation.

use crate::error::{Result, ServerError};
use crate::gateway::{PeerFeed, PeerId, PeerRegistry};
use lyre_core::Track;
use lyre_playback::{
    dispatch, Direction, Generation, PlayMode, PlaybackEngine, PlaybackEvent, RemoteCommand,
    ResourceEvent, ResourceListener, SessionStatus,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type EngineJob = Box<dyn FnOnce(&mut PlaybackEngine) + Send>;

enum SessionInput {
    Command(RemoteCommand),
    Resource(Generation, ResourceEvent),
    Run(EngineJob),
    Subscribe(oneshot::Sender<(PeerId, PeerFeed)>),
    Shutdown(oneshot::Sender<()>),
}

/// Spawns the session loop
pub struct Session;

impl Session {
    /// Build the engine and start its loop
    ///
    /// `build` receives the listener that feeds resource events back into
    /// the loop; pass it to `PlaybackEngine::new`.
    pub fn spawn<F>(peers: Arc<PeerRegistry>, build: F) -> (SessionHandle, JoinHandle<()>)
    where
        F: FnOnce(ResourceListener) -> PlaybackEngine,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        let resource_tx = tx.clone();
        let listener: ResourceListener = Arc::new(move |generation, event| {
            let _ = resource_tx.send(SessionInput::Resource(generation, event));
        });

        let engine = build(listener);
        let task = tokio::spawn(run(engine, peers, rx));

        (SessionHandle { tx }, task)
    }
}

async fn run(
    mut engine: PlaybackEngine,
    peers: Arc<PeerRegistry>,
    mut rx: mpsc::UnboundedReceiver<SessionInput>,
) {
    tracing::debug!("Session loop started");

    while let Some(input) = rx.recv().await {
        match input {
            SessionInput::Command(command) => dispatch(&mut engine, command),
            SessionInput::Resource(generation, event) => {
                engine.on_resource_event(generation, event);
            }
            SessionInput::Run(job) => job(&mut engine),
            SessionInput::Subscribe(reply) => {
                let (id, feed) = peers.register();
                peers.send_to(id, &engine.snapshot());
                if reply.send((id, feed)).is_err() {
                    peers.unregister(id);
                }
            }
            SessionInput::Shutdown(reply) => {
                let _ = reply.send(());
                break;
            }
        }

        publish(&mut engine, &peers);
    }

    tracing::debug!("Session loop stopped");
}

fn publish(engine: &mut PlaybackEngine, peers: &PeerRegistry) {
    let mut status_changed = false;

    for event in engine.drain_events() {
        match event {
            PlaybackEvent::StatusChanged => status_changed = true,
            PlaybackEvent::TrackChanged { url } => {
                tracing::info!("Now playing {}", url);
                status_changed = true;
            }
            PlaybackEvent::FavoritesChanged { count } => {
                tracing::debug!("{} favorites", count);
            }
        }
    }

    if status_changed {
        let delivered = peers.broadcast(&engine.snapshot());
        tracing::trace!("Status broadcast to {} peers", delivered);
    }
}

/// Cloneable handle to the session loop
///
/// This is the host control surface: every method is applied on the loop,
/// in call order relative to remote commands and resource events.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionInput>,
}

impl SessionHandle {
    fn send(&self, input: SessionInput) -> Result<()> {
        self.tx.send(input).map_err(|_| ServerError::SessionClosed)
    }

    /// Queue a remote command
    pub fn command(&self, command: RemoteCommand) -> Result<()> {
        self.send(SessionInput::Command(command))
    }

    /// Run `f` on the engine and return its result
    pub async fn with<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut PlaybackEngine) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionInput::Run(Box::new(move |engine| {
            let _ = reply_tx.send(f(engine));
        })))?;
        reply_rx.await.map_err(|_| ServerError::SessionClosed)
    }

    /// Register a control peer; its feed starts with the current snapshot
    pub async fn subscribe(&self) -> Result<(PeerId, PeerFeed)> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionInput::Subscribe(reply_tx))?;
        reply_rx.await.map_err(|_| ServerError::SessionClosed)
    }

    /// Stop the loop after everything queued before this call
    pub async fn shutdown(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionInput::Shutdown(reply_tx))?;
        reply_rx.await.map_err(|_| ServerError::SessionClosed)
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        self.with(|engine| engine.status()).await
    }

    pub async fn load_and_play(&self, track: Track, playlist: Vec<Track>) -> Result<SessionStatus> {
        self.with(move |engine| {
            engine.load_and_play(track, playlist);
            engine.status()
        })
        .await
    }

    pub async fn play(&self) -> Result<()> {
        self.with(PlaybackEngine::play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.with(PlaybackEngine::pause).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.with(PlaybackEngine::toggle).await
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        self.with(move |engine| engine.seek(seconds)).await
    }

    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        self.with(move |engine| engine.set_volume(volume)).await
    }

    pub async fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.with(move |engine| engine.set_playback_rate(rate)).await
    }

    pub async fn set_mode(&self, mode: PlayMode) -> Result<()> {
        self.with(move |engine| engine.set_mode(mode)).await
    }

    pub async fn advance(&self, direction: Direction) -> Result<()> {
        self.with(move |engine| engine.advance(direction)).await
    }

    pub async fn add_favorite(&self, track: Track) -> Result<bool> {
        self.with(move |engine| engine.add_favorite(track)).await
    }

    pub async fn remove_favorite(&self, track: Track) -> Result<bool> {
        self.with(move |engine| engine.remove_favorite(&track)).await
    }

    /// Returns the new membership
    pub async fn toggle_favorite(&self, track: Track) -> Result<bool> {
        self.with(move |engine| engine.toggle_favorite(track)).await
    }

    pub async fn reset(&self) -> Result<SessionStatus> {
        self.with(|engine| {
            engine.reset();
            engine.status()
        })
        .await
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
