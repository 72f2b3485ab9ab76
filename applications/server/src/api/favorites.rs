/// Favorites API routes
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use lyre_core::{Catalog, Track};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub favorite: bool,
}

/// POST /api/favorites/toggle
///
/// Tracks missing from the catalog are still accepted and stored bare.
pub async fn toggle(
    State(app_state): State<AppState>,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<FavoriteResponse>> {
    let track = app_state
        .catalog
        .find_track(&req.url, Some(&req.name))?
        .unwrap_or_else(|| Track::new(req.url, req.name));

    let favorite = app_state.session.toggle_favorite(track).await?;
    Ok(Json(FavoriteResponse { favorite }))
}
