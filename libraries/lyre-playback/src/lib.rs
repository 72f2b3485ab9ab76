//! Lyre - Playback State Machine
//!
//! Platform-agnostic playback control for Lyre.
//!
//! This crate provides:
//! - The authoritative `PlaybackSession` and the engine that mutates it
//! - Play modes (sequence, random with history, loop)
//! - Bounded navigation history for random mode
//! - Audio resource lifecycle (acquire, swap, release)
//! - Resumable state persistence over a key/value store
//! - Remote command parsing and dispatch
//! - Favorites
//!
//! # Architecture
//!
//! `lyre-playback` never touches audio hardware, sockets, or the filesystem.
//! The host supplies:
//! - an `AudioBackend` creating `AudioResource`s
//! - a `KeyValueStore` for snapshots
//! - a loop that feeds commands and resource events to the engine and fans
//!   out the `PlaybackEvent`s it queues
//!
//! # Example: Remote Commands
//!
//! ```rust
//! use lyre_playback::{CommandValue, PlayMode, RemoteCommand};
//!
//! let value = CommandValue::Text("random".to_string());
//! let command = RemoteCommand::parse("mode", Some(&value));
//! assert_eq!(command, Some(RemoteCommand::Mode(PlayMode::Random)));
//!
//! // Unknown commands are dropped
//! assert_eq!(RemoteCommand::parse("eject", None), None);
//! ```
//!
//! # Example: Navigation History
//!
//! ```rust
//! use lyre_playback::History;
//!
//! let mut history = History::new(100);
//! history.record(4);
//! history.record(2);
//!
//! assert_eq!(history.step_backward(), Some(4));
//! assert_eq!(history.step_forward(), Some(2));
//! assert_eq!(history.step_forward(), None);
//! ```

#![forbid(unsafe_code)]

pub mod command;
pub mod engine;
pub mod error;
pub mod events;
pub mod favorites;
pub mod history;
pub mod persistence;
pub mod resource;
pub mod types;

pub use command::{dispatch, CommandValue, RemoteCommand};
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use favorites::Favorites;
pub use history::History;
pub use persistence::{KeyValueStore, MemoryStore, Persistence, RestoredState, WriteKind};
pub use resource::{
    AudioBackend, AudioResource, Generation, OutputSettings, ResourceEvent, ResourceLifecycle,
    ResourceListener,
};
pub use types::{
    Direction, PlayMode, PlaybackConfig, PlaybackSession, SessionStatus, StatusSnapshot,
};
