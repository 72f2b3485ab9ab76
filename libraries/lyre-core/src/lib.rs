//! Lyre Core
//!
//! Domain types, the catalog query interface, and error handling shared by
//! every Lyre crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`
//! - **Core Traits**: `Catalog` (read-only view of the music library)
//! - **Error Handling**: Unified `LyreError` and `Result` types
//!
//! The library-import pipeline that fills the catalog lives outside this
//! workspace; Lyre only reads what it produced.
//!
//! # Example
//!
//! ```rust
//! use lyre_core::{Catalog, MemoryCatalog, Playlist, Track};
//!
//! let track = Track::new("/music/song.mp3", "song.mp3");
//! let catalog = MemoryCatalog::new(
//!     vec![track.clone()],
//!     vec![Playlist::new("Evening", vec![track])],
//! );
//!
//! assert_eq!(catalog.list_tracks().unwrap().len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{Catalog, JsonCatalog, MemoryCatalog};
pub use error::{LyreError, Result};
pub use types::{Playlist, Track};
