//! Lyre Server Library
//!
//! Playback host with LAN remote control: owns the playback session, persists
//! it to a state file, and keeps phone/browser peers in sync over WebSocket.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod net;
pub mod session;
pub mod state;
pub mod store;

// Re-export commonly used types for convenience
pub use backend::{catalog_durations, DurationLookup, HeadlessBackend};
pub use catalog::{LibraryCatalog, LibrarySummary};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use gateway::PeerRegistry;
pub use session::{Session, SessionHandle};
pub use state::AppState;
pub use store::FileStore;
