use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, MediaKind, MovieId, SeasonDetails, TitleDetails},
    services::{CatalogProvider, Category},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// A catalog item as the browse pages render it
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub saved: bool,
}

impl CatalogEntry {
    fn new(catalog: &dyn CatalogProvider, item: CatalogItem, saved: &HashSet<MovieId>) -> Self {
        Self {
            poster_url: item.poster_path.as_deref().map(|p| catalog.image_url(p)),
            backdrop_url: item.backdrop_path.as_deref().map(|p| catalog.image_url(p)),
            saved: saved.contains(&item.id),
            item,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RowSummary {
    pub category: Category,
    pub title: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RowResponse {
    pub category: Category,
    pub title: &'static str,
    pub items: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct DetailsResponse {
    #[serde(flatten)]
    pub details: TitleDetails,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub saved: bool,
}

fn parse_category(slug: &str) -> AppResult<Category> {
    Category::from_slug(slug).ok_or_else(|| AppError::NotFound(format!("Unknown row: {}", slug)))
}

async fn entries(state: &AppState, items: Vec<CatalogItem>) -> Vec<CatalogEntry> {
    let saved = state.favorites.saved_ids().await;
    items
        .into_iter()
        .map(|item| CatalogEntry::new(state.catalog.as_ref(), item, &saved))
        .collect()
}

/// Lists the browse rows in home page order
pub async fn list_rows() -> Json<Vec<RowSummary>> {
    Json(
        Category::ALL
            .into_iter()
            .map(|category| RowSummary {
                category,
                title: category.title(),
            })
            .collect(),
    )
}

pub async fn get_row(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<RowResponse>> {
    let category = parse_category(&slug)?;
    let items = state.catalog.fetch_category(category).await?;

    Ok(Json(RowResponse {
        category,
        title: category.title(),
        items: entries(&state, items).await,
    }))
}

/// One random original series with a backdrop, for the home page banner
pub async fn featured(State(state): State<AppState>) -> AppResult<Json<CatalogEntry>> {
    let candidates: Vec<CatalogItem> = state
        .catalog
        .fetch_category(Category::Originals)
        .await?
        .into_iter()
        .filter(|item| item.backdrop_path.is_some())
        .collect();

    if candidates.is_empty() {
        return Err(AppError::NotFound("No featured title available".to_string()));
    }

    let pick = (Uuid::new_v4().as_u128() % candidates.len() as u128) as usize;
    let item = candidates
        .into_iter()
        .nth(pick)
        .ok_or_else(|| AppError::Internal("Featured pick out of range".to_string()))?;

    let saved = state.favorites.saved_ids().await;
    Ok(Json(CatalogEntry::new(state.catalog.as_ref(), item, &saved)))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let items = state.catalog.search(&params.q).await?;
    Ok(Json(entries(&state, items).await))
}

async fn details(state: &AppState, kind: MediaKind, id: MovieId) -> AppResult<DetailsResponse> {
    let details = state.catalog.fetch_details(kind, id).await?;
    let saved = state.favorites.is_saved(details.id).await;

    Ok(DetailsResponse {
        poster_url: details.poster_path.as_deref().map(|p| state.catalog.image_url(p)),
        backdrop_url: details
            .backdrop_path
            .as_deref()
            .map(|p| state.catalog.image_url(p)),
        saved,
        details,
    })
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<DetailsResponse>> {
    Ok(Json(details(&state, MediaKind::Movie, MovieId(id)).await?))
}

pub async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<DetailsResponse>> {
    Ok(Json(details(&state, MediaKind::Tv, MovieId(id)).await?))
}

pub async fn get_season(
    State(state): State<AppState>,
    Path((id, season)): Path<(u64, u32)>,
) -> AppResult<Json<SeasonDetails>> {
    let details = state.catalog.fetch_season(MovieId(id), season).await?;
    Ok(Json(details))
}
