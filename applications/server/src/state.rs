/// Shared application state
use crate::catalog::LibraryCatalog;
use crate::gateway::PeerRegistry;
use crate::session::SessionHandle;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub catalog: Arc<LibraryCatalog>,
    pub peers: Arc<PeerRegistry>,
}

impl AppState {
    pub fn new(
        session: SessionHandle,
        catalog: Arc<LibraryCatalog>,
        peers: Arc<PeerRegistry>,
    ) -> Self {
        Self {
            session,
            catalog,
            peers,
        }
    }
}
