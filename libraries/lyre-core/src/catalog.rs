//! Catalog query interface
//!
//! The catalog is produced by the external library importer. Lyre treats it
//! as read-only input: it lists tracks and playlists and never writes back.

use crate::error::{LyreError, Result};
use crate::types::{Playlist, Track};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Track catalog file inside the library directory
pub const TRACKS_FILE: &str = "songs.json";

/// Playlist catalog file inside the library directory
pub const PLAYLISTS_FILE: &str = "menus.json";

/// Read-only view of the music library
pub trait Catalog: Send + Sync {
    /// List every known track, in catalog order
    fn list_tracks(&self) -> Result<Vec<Track>>;

    /// List every playlist
    fn list_playlists(&self) -> Result<Vec<Playlist>>;

    /// Find a track by URL, optionally narrowed by name
    ///
    /// Without a name the first entry with the URL wins.
    fn find_track(&self, url: &str, name: Option<&str>) -> Result<Option<Track>> {
        Ok(self
            .list_tracks()?
            .into_iter()
            .find(|t| t.matches(url, name)))
    }

    /// Find a playlist by name
    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
        Ok(self.list_playlists()?.into_iter().find(|p| p.name == name))
    }
}

/// Catalog backed by the importer's JSON files
///
/// Files are re-read on every query so imports that finish while the host is
/// running become visible without a restart. A missing or blank file reads as
/// an empty list.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    library_dir: PathBuf,
}

impl JsonCatalog {
    /// Create a catalog over `library_dir`
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
        }
    }

    /// Directory holding the catalog files
    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.library_dir.join(file);

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Catalog file {} not present", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| LyreError::catalog(format!("{}: {}", path.display(), e)))
    }
}

impl Catalog for JsonCatalog {
    fn list_tracks(&self) -> Result<Vec<Track>> {
        self.read_list(TRACKS_FILE)
    }

    fn list_playlists(&self) -> Result<Vec<Playlist>> {
        self.read_list(PLAYLISTS_FILE)
    }
}

/// In-memory catalog, used by hosts that build the library themselves
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tracks: Vec<Track>,
    playlists: Vec<Playlist>,
}

impl MemoryCatalog {
    /// Create a catalog from fixed contents
    pub fn new(tracks: Vec<Track>, playlists: Vec<Playlist>) -> Self {
        Self { tracks, playlists }
    }

    /// Copy every entry out of another catalog
    pub fn snapshot_of(catalog: &dyn Catalog) -> Result<Self> {
        Ok(Self::new(catalog.list_tracks()?, catalog.list_playlists()?))
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }
}

impl Catalog for MemoryCatalog {
    fn list_tracks(&self) -> Result<Vec<Track>> {
        Ok(self.tracks.clone())
    }

    fn list_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(self.playlists.clone())
    }

    fn find_track(&self, url: &str, name: Option<&str>) -> Result<Option<Track>> {
        Ok(self.tracks.iter().find(|t| t.matches(url, name)).cloned())
    }

    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
        Ok(self.playlists.iter().find(|p| p.name == name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, contents: &str) {
        std::fs::write(dir.path().join(file), contents).unwrap();
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = JsonCatalog::new(dir.path());

        assert!(catalog.list_tracks().unwrap().is_empty());
        assert!(catalog.list_playlists().unwrap().is_empty());
    }

    #[test]
    fn blank_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        write(&dir, TRACKS_FILE, "  \n");

        let catalog = JsonCatalog::new(dir.path());
        assert!(catalog.list_tracks().unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_a_catalog_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, PLAYLISTS_FILE, "{not json");

        let catalog = JsonCatalog::new(dir.path());
        assert!(matches!(
            catalog.list_playlists(),
            Err(LyreError::Catalog(_))
        ));
    }

    #[test]
    fn duplicate_urls_are_kept_and_disambiguated_by_name() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            TRACKS_FILE,
            r#"[
                {"url": "/music/a.mp3", "name": "a.mp3", "title": "First"},
                {"url": "/music/a.mp3", "name": "a-copy.mp3", "title": "Second"}
            ]"#,
        );

        let catalog = JsonCatalog::new(dir.path());
        assert_eq!(catalog.list_tracks().unwrap().len(), 2);

        let first = catalog.find_track("/music/a.mp3", None).unwrap().unwrap();
        assert_eq!(first.title, "First");

        let copy = catalog
            .find_track("/music/a.mp3", Some("a-copy.mp3"))
            .unwrap()
            .unwrap();
        assert_eq!(copy.title, "Second");
    }

    #[test]
    fn memory_snapshot_copies_json_catalog() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            TRACKS_FILE,
            r#"[{"url": "/music/a.mp3", "name": "a.mp3"}, {"url": "/music/b.mp3", "name": "b.mp3"}]"#,
        );

        let snapshot = MemoryCatalog::snapshot_of(&JsonCatalog::new(dir.path())).unwrap();

        assert_eq!(snapshot.track_count(), 2);
        assert_eq!(snapshot.playlist_count(), 0);
        assert!(snapshot.find_track("/music/b.mp3", None).unwrap().is_some());
    }

    #[test]
    fn find_playlist_by_name() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            PLAYLISTS_FILE,
            r#"[{"name": "Evening", "musicList": [{"url": "/music/a.mp3", "name": "a.mp3"}]}]"#,
        );

        let catalog = JsonCatalog::new(dir.path());
        let playlist = catalog.find_playlist("Evening").unwrap().unwrap();
        assert_eq!(playlist.music_list.len(), 1);
        assert!(catalog.find_playlist("Morning").unwrap().is_none());
    }
}
