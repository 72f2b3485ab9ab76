/// API route modules
pub mod favorites;
pub mod health;
pub mod library;
pub mod playback;

use crate::{config::RemoteSettings, gateway, state::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the full router: host API, gateway socket, and static files
pub fn create_router(app_state: AppState, remote: &RemoteSettings) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/status", get(playback::get_status))
        .route("/tracks", get(library::list_tracks))
        .route("/playlists", get(library::list_playlists))
        .route("/library/reload", post(library::reload))
        .route("/play", post(playback::play))
        .route("/reset", post(playback::reset))
        .route("/favorites/toggle", post(favorites::toggle));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/socket", get(gateway::socket_handler));

    if let Some(covers_dir) = &remote.covers_dir {
        router = router.nest_service("/covers", ServeDir::new(covers_dir));
    }

    // Phone control page
    if let Some(public_dir) = &remote.public_dir {
        router = router.fallback_service(ServeDir::new(public_dir));
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
