//! In-memory library catalog
//!
//! Queries are answered from a snapshot held in memory, so neither the
//! session loop (duration lookups) nor the request handlers touch the disk.
//! `reload` reads the importer's files on the blocking pool and swaps the
//! snapshot in one step; a failed reload keeps the previous one.

use crate::error::{Result, ServerError};
use lyre_core::{Catalog, MemoryCatalog, Playlist, Track};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// Counts reported after a reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LibrarySummary {
    pub tracks: usize,
    pub playlists: usize,
}

pub struct LibraryCatalog {
    source: Arc<dyn Catalog>,
    snapshot: RwLock<Arc<MemoryCatalog>>,
}

impl LibraryCatalog {
    /// Wrap `source`; the snapshot stays empty until the first `reload`
    pub fn new(source: Arc<dyn Catalog>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::default()),
        }
    }

    /// Re-read the source off the async runtime and replace the snapshot
    pub async fn reload(&self) -> Result<LibrarySummary> {
        let source = Arc::clone(&self.source);
        let loaded = tokio::task::spawn_blocking(move || MemoryCatalog::snapshot_of(&*source))
            .await
            .map_err(|e| ServerError::Internal(format!("catalog reload task failed: {}", e)))??;

        let summary = LibrarySummary {
            tracks: loaded.track_count(),
            playlists: loaded.playlist_count(),
        };
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(loaded);

        tracing::info!(
            "Library loaded: {} tracks, {} playlists",
            summary.tracks,
            summary.playlists
        );
        Ok(summary)
    }

    fn current(&self) -> Arc<MemoryCatalog> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Catalog for LibraryCatalog {
    fn list_tracks(&self) -> lyre_core::Result<Vec<Track>> {
        self.current().list_tracks()
    }

    fn list_playlists(&self) -> lyre_core::Result<Vec<Playlist>> {
        self.current().list_playlists()
    }

    fn find_track(&self, url: &str, name: Option<&str>) -> lyre_core::Result<Option<Track>> {
        self.current().find_track(url, name)
    }

    fn find_playlist(&self, name: &str) -> lyre_core::Result<Option<Playlist>> {
        self.current().find_playlist(name)
    }
}

impl std::fmt::Debug for LibraryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current();
        f.debug_struct("LibraryCatalog")
            .field("tracks", &current.track_count())
            .field("playlists", &current.playlist_count())
            .finish_non_exhaustive()
    }
}
