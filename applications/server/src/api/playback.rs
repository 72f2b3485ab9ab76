/// Playback session API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{extract::State, Json};
use lyre_core::{Catalog, LyreError, Track};
use lyre_playback::SessionStatus;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub url: String,
    /// Disambiguates duplicate URLs
    #[serde(default)]
    pub name: Option<String>,
    /// Playlist to play from; the whole catalog when absent
    #[serde(default)]
    pub playlist: Option<String>,
}

/// GET /api/status - Current session status
pub async fn get_status(State(app_state): State<AppState>) -> Result<Json<SessionStatus>> {
    Ok(Json(app_state.session.status().await?))
}

/// POST /api/play - Load a playlist and play one of its tracks
pub async fn play(
    State(app_state): State<AppState>,
    Json(req): Json<PlayRequest>,
) -> Result<Json<SessionStatus>> {
    if req.url.trim().is_empty() {
        return Err(ServerError::BadRequest("url is required".to_string()));
    }

    let tracks = match &req.playlist {
        Some(name) => {
            app_state
                .catalog
                .find_playlist(name)?
                .ok_or_else(|| LyreError::not_found("Playlist", name.as_str()))?
                .music_list
        }
        None => app_state.catalog.list_tracks()?,
    };

    let track: Track = tracks
        .iter()
        .find(|t| t.matches(&req.url, req.name.as_deref()))
        .cloned()
        .ok_or_else(|| LyreError::not_found("Track", req.url.as_str()))?;

    tracing::info!(
        "Host requested {} from {}",
        track.display_title(),
        req.playlist.as_deref().unwrap_or("library")
    );

    let status = app_state.session.load_and_play(track, tracks).await?;
    Ok(Json(status))
}

/// POST /api/reset - Release the resource and clear the session
pub async fn reset(State(app_state): State<AppState>) -> Result<Json<SessionStatus>> {
    Ok(Json(app_state.session.reset().await?))
}
