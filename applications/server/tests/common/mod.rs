//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::Router;
use lyre_core::{MemoryCatalog, Playlist, Track};
use lyre_playback::{MemoryStore, PlaybackConfig, PlaybackEngine};
use lyre_server::{
    api, catalog_durations, config::RemoteSettings, gateway::PeerFeed, AppState, HeadlessBackend,
    LibraryCatalog, PeerRegistry, Session, SessionHandle,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Clock tick long enough that no progress fires during a test
const IDLE_TICK: Duration = Duration::from_secs(3600);

pub struct TestApp {
    pub router: Router,
    pub session: SessionHandle,
    pub peers: Arc<PeerRegistry>,
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<LibraryCatalog>,
    pub task: JoinHandle<()>,
}

/// Library fixture: three tracks, one playlist holding the last two
pub fn library() -> (Vec<Track>, Vec<Playlist>) {
    let tracks: Vec<Track> = ["intro", "river", "night"]
        .iter()
        .map(|name| {
            let mut track = Track::new(format!("/music/{name}.mp3"), format!("{name}.mp3"));
            track.artist = "Fixture Band".to_string();
            track.duration = 200.0;
            track
        })
        .collect();
    let evening = Playlist::new("Evening", tracks[1..].to_vec());
    (tracks, vec![evening])
}

/// Start a session loop and router over the fixture library
pub async fn spawn_app() -> TestApp {
    let (tracks, playlists) = library();
    spawn_app_with(tracks, playlists, IDLE_TICK).await
}

/// Start a session loop and router over in-memory collaborators
pub async fn spawn_app_with(tracks: Vec<Track>, playlists: Vec<Playlist>, tick: Duration) -> TestApp {
    let source = Arc::new(MemoryCatalog::new(tracks, playlists));
    let catalog = Arc::new(LibraryCatalog::new(source));
    catalog.reload().await.unwrap();
    let store = Arc::new(MemoryStore::new());
    let peers = Arc::new(PeerRegistry::new());

    let backend = HeadlessBackend::new(tick, catalog_durations(catalog.clone()));
    let kv_store = store.clone();
    let (session, task) = Session::spawn(Arc::clone(&peers), move |listener| {
        PlaybackEngine::new(
            PlaybackConfig::default(),
            Box::new(backend),
            listener,
            kv_store,
        )
    });

    let state = AppState::new(session.clone(), Arc::clone(&catalog), Arc::clone(&peers));
    let router = api::create_router(state, &RemoteSettings::default());

    TestApp {
        router,
        session,
        peers,
        store,
        catalog,
        task,
    }
}

/// Decode the newest frame for a peer, `None` if nothing new was published
pub fn latest_frame(feed: &mut PeerFeed) -> Option<serde_json::Value> {
    if !feed.has_changed().unwrap_or(false) {
        return None;
    }
    let frame = feed.borrow_and_update().clone()?;
    Some(serde_json::from_str(&frame).unwrap())
}
