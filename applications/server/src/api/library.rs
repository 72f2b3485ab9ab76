/// Catalog API routes
use crate::{catalog::LibrarySummary, error::Result, state::AppState};
use axum::{extract::State, Json};
use lyre_core::{Catalog, Playlist, Track};

/// GET /api/tracks
pub async fn list_tracks(State(app_state): State<AppState>) -> Result<Json<Vec<Track>>> {
    Ok(Json(app_state.catalog.list_tracks()?))
}

/// GET /api/playlists
pub async fn list_playlists(State(app_state): State<AppState>) -> Result<Json<Vec<Playlist>>> {
    Ok(Json(app_state.catalog.list_playlists()?))
}

/// POST /api/library/reload - Pick up a finished import
pub async fn reload(State(app_state): State<AppState>) -> Result<Json<LibrarySummary>> {
    Ok(Json(app_state.catalog.reload().await?))
}
