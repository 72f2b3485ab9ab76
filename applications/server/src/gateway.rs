//! Remote Sync Gateway
//!
//! WebSocket endpoint for control peers (phones, browsers on the LAN).
//!
//! | Direction | Frame |
//! |-----------|-------|
//! | inbound   | `{"event":"control","command":"next","value":null}` |
//! | outbound  | `{"event":"player-status-update","data":{...}}` |
//!
//! Each peer gets a latest-value feed drained by its own writer task, so the
//! session loop never waits on a socket. A peer that writes slower than the
//! session changes skips intermediate snapshots but always ends on the
//! newest one. A closed feed removes the peer on the next broadcast.

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use lyre_playback::{CommandValue, RemoteCommand, StatusSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use uuid::Uuid;

pub type PeerId = Uuid;

/// Encoded outbound frame shared by every peer
pub type Frame = Arc<str>;

/// Latest frame for one peer; `None` until the first snapshot
pub type PeerFeed = watch::Receiver<Option<Frame>>;

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum Inbound {
    Control {
        command: String,
        #[serde(default)]
        value: Option<CommandValue>,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum Outbound<'a> {
    PlayerStatusUpdate(&'a StatusSnapshot),
}

/// Encode a status snapshot as an outbound frame
pub fn encode_status(snapshot: &StatusSnapshot) -> Option<Frame> {
    match serde_json::to_string(&Outbound::PlayerStatusUpdate(snapshot)) {
        Ok(json) => Some(Frame::from(json)),
        Err(e) => {
            tracing::warn!("Failed to encode status snapshot: {}", e);
            None
        }
    }
}

/// Parse an inbound text frame into a command
///
/// Anything that is not a well-formed control message is dropped.
pub fn parse_control(text: &str) -> Option<RemoteCommand> {
    match serde_json::from_str::<Inbound>(text) {
        Ok(Inbound::Control { command, value }) => RemoteCommand::parse(&command, value.as_ref()),
        Err(e) => {
            tracing::debug!("Dropping malformed frame: {}", e);
            None
        }
    }
}

type PeerMap = HashMap<PeerId, watch::Sender<Option<Frame>>>;

/// Currently connected peers
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: Mutex<PeerMap>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer, returning its id and outbound feed
    pub fn register(&self) -> (PeerId, PeerFeed) {
        let (tx, rx) = watch::channel(None);
        let id = Uuid::new_v4();
        self.lock().insert(id, tx);
        (id, rx)
    }

    pub fn unregister(&self, id: PeerId) {
        self.lock().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Publish a snapshot to one peer
    pub fn send_to(&self, id: PeerId, snapshot: &StatusSnapshot) {
        let Some(frame) = encode_status(snapshot) else {
            return;
        };
        if let Some(tx) = self.lock().get(&id) {
            tx.send_replace(Some(frame));
        }
    }

    /// Publish a snapshot to every peer; returns how many are still connected
    ///
    /// An unread frame is replaced, never queued behind.
    pub fn broadcast(&self, snapshot: &StatusSnapshot) -> usize {
        let Some(frame) = encode_status(snapshot) else {
            return 0;
        };

        let mut delivered = 0;
        self.lock()
            .retain(|id, tx| match tx.send(Some(Arc::clone(&frame))) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::debug!("Pruning disconnected peer {}", id);
                    false
                }
            });
        delivered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PeerMap> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// GET /socket - upgrade to a control peer connection
pub async fn socket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_peer(socket, state))
}

async fn handle_peer(socket: WebSocket, state: AppState) {
    // Registered through the session loop so the first frame is the
    // current snapshot and nothing older follows it
    let (peer_id, mut outbound) = match state.session.subscribe().await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::warn!("Rejecting peer: {}", e);
            return;
        }
    };
    tracing::info!(
        "Remote peer {} connected ({} total)",
        peer_id,
        state.peers.len()
    );

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        loop {
            let frame = outbound.borrow_and_update().clone();
            if let Some(frame) = frame {
                if sink.send(Message::Text(frame.to_string())).await.is_err() {
                    break;
                }
            }
            if outbound.changed().await.is_err() {
                break;
            }
        }
    });

    let session = state.session.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => {
                    if let Some(command) = parse_control(&text) {
                        if session.command(command).is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    state.peers.unregister(peer_id);
    tracing::info!("Remote peer {} disconnected", peer_id);
}
