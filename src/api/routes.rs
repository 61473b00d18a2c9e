use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{auth, catalog, favorites, playback, AppState};
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/catalog/rows", get(catalog::list_rows))
        .route("/catalog/rows/:category", get(catalog::get_row))
        .route("/catalog/featured", get(catalog::featured))
        .route("/catalog/search", get(catalog::search))
        .route("/catalog/movie/:id", get(catalog::get_movie))
        .route("/catalog/tv/:id", get(catalog::get_series))
        .route("/catalog/tv/:id/season/:season", get(catalog::get_season))
        // Playback
        .route("/playback/movie/:id", get(playback::play_movie))
        .route("/playback/tv/:id/:season/:episode", get(playback::play_episode))
        .route("/playback/trailer/:kind/:id", get(playback::trailer))
        // Auth
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/password", post(auth::update_password))
        .route("/auth/recover", post(auth::recover))
        .route("/auth/recovery-session", post(auth::recovery_session))
        .route("/auth/session", get(auth::current_session))
        // Favorites
        .route("/favorites", get(favorites::list))
        .route("/favorites/toggle", post(favorites::toggle))
        .route("/favorites/reload", post(favorites::reload))
        .route("/favorites/:movie_id", get(favorites::membership))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
