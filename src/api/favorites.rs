use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{FavoriteRecord, MediaSnapshot, Membership, MovieId},
    services::{LoadOutcome, ToggleOutcome},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub movie_id: MovieId,
    pub movie_data: MediaSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub movie_id: MovieId,
    pub outcome: ToggleOutcome,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub loaded: bool,
    pub items: Vec<FavoriteRecord>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub movie_id: MovieId,
    pub membership: Membership,
    pub saved: bool,
    pub pending: bool,
}

/// The Vault: saved titles of the signed-in user, newest first
pub async fn list(State(state): State<AppState>) -> AppResult<Json<FavoritesResponse>> {
    if state.favorites.identity().await.is_none() {
        return Err(AppError::Unauthenticated);
    }

    Ok(Json(FavoritesResponse {
        loaded: state.favorites.is_loaded().await,
        items: state.favorites.list().await,
    }))
}

pub async fn toggle(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> AppResult<Json<ToggleResponse>> {
    let outcome = state
        .favorites
        .toggle(request.movie_id, request.movie_data)
        .await?;

    Ok(Json(ToggleResponse {
        movie_id: request.movie_id,
        outcome,
        saved: state.favorites.is_saved(request.movie_id).await,
    }))
}

pub async fn membership(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> Json<MembershipResponse> {
    let movie_id = MovieId(movie_id);
    let membership = state.favorites.membership(movie_id).await;

    Json(MembershipResponse {
        movie_id,
        saved: membership.is_saved(),
        membership,
        pending: state.favorites.is_pending(movie_id),
    })
}

pub async fn reload(State(state): State<AppState>) -> AppResult<Json<LoadOutcome>> {
    let outcome = state.favorites.refresh().await?;
    Ok(Json(outcome))
}
