use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{MediaKind, MovieId},
    services::{PlaybackLink, PlaybackTarget},
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct TrailerResponse {
    pub id: MovieId,
    pub key: String,
    pub url: String,
}

pub async fn play_movie(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<PlaybackLink>> {
    let link = state
        .playback
        .player_url(PlaybackTarget::Movie { id: MovieId(id) })?;
    Ok(Json(link))
}

pub async fn play_episode(
    State(state): State<AppState>,
    Path((id, season, episode)): Path<(u64, u32, u32)>,
) -> AppResult<Json<PlaybackLink>> {
    let link = state.playback.player_url(PlaybackTarget::Episode {
        series_id: MovieId(id),
        season,
        episode,
    })?;
    Ok(Json(link))
}

/// Trailer embed for a title, if the catalog lists one
pub async fn trailer(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, u64)>,
) -> AppResult<Json<TrailerResponse>> {
    let kind = MediaKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Unknown media kind: {}", kind)))?;
    let details = state.catalog.fetch_details(kind, MovieId(id)).await?;

    let key = details
        .trailer_key
        .ok_or_else(|| AppError::NotFound(format!("No trailer for {} {}", kind, id)))?;
    let url = state.playback.trailer_url(&key)?;

    Ok(Json(TrailerResponse {
        id: details.id,
        key,
        url,
    }))
}
