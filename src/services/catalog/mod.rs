//! Catalog metadata abstraction
//!
//! The browse rows, the detail view, season listings and search all come from
//! one metadata provider. The favorites store never talks to it; snapshots
//! handed to `toggle` are built from catalog items by the caller.

use std::fmt::Display;

use serde::Serialize;

use crate::{
    error::AppResult,
    models::{CatalogItem, MediaKind, MovieId, SeasonDetails, TitleDetails},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// A browse row on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trending,
    Originals,
    TopRated,
    Action,
    Comedy,
    Horror,
    Romance,
    Documentaries,
}

/// Network id of the original-series row
const ORIGINALS_NETWORK: u32 = 213;

impl Category {
    /// Rows in home page order
    pub const ALL: [Category; 8] = [
        Category::Trending,
        Category::Originals,
        Category::TopRated,
        Category::Action,
        Category::Comedy,
        Category::Horror,
        Category::Romance,
        Category::Documentaries,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Trending => "trending",
            Category::Originals => "originals",
            Category::TopRated => "top_rated",
            Category::Action => "action",
            Category::Comedy => "comedy",
            Category::Horror => "horror",
            Category::Romance => "romance",
            Category::Documentaries => "documentaries",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }

    /// Row heading shown above the posters
    pub fn title(&self) -> &'static str {
        match self {
            Category::Trending => "Trending Now",
            Category::Originals => "Originals",
            Category::TopRated => "Top Rated",
            Category::Action => "Action Movies",
            Category::Comedy => "Comedy Movies",
            Category::Horror => "Horror Movies",
            Category::Romance => "Romance Movies",
            Category::Documentaries => "Documentaries",
        }
    }

    /// Genre filter for the discover-based rows
    pub fn genre_id(&self) -> Option<u32> {
        match self {
            Category::Action => Some(28),
            Category::Comedy => Some(35),
            Category::Horror => Some(27),
            Category::Romance => Some(10749),
            Category::Documentaries => Some(99),
            _ => None,
        }
    }

    /// Provider path and extra query parameters for this row
    pub fn request(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            Category::Trending => ("/trending/all/week", vec![]),
            Category::Originals => (
                "/discover/tv",
                vec![("with_networks", ORIGINALS_NETWORK.to_string())],
            ),
            Category::TopRated => ("/movie/top_rated", vec![]),
            genre => (
                "/discover/movie",
                genre
                    .genre_id()
                    .map(|id| vec![("with_genres", id.to_string())])
                    .unwrap_or_default(),
            ),
        }
    }

    /// Kind of every item in this row when the provider omits `media_type`
    pub fn default_kind(&self) -> MediaKind {
        match self {
            Category::Originals => MediaKind::Tv,
            _ => MediaKind::Movie,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// Read-only metadata provider
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// First page of a browse row
    async fn fetch_category(&self, category: Category) -> AppResult<Vec<CatalogItem>>;

    /// Movies and series matching `query`; items without a poster are dropped
    async fn search(&self, query: &str) -> AppResult<Vec<CatalogItem>>;

    /// Detail view of one title, including its trailer key if it has one
    async fn fetch_details(&self, kind: MediaKind, id: MovieId) -> AppResult<TitleDetails>;

    /// Episode listing of one season of a series
    async fn fetch_season(&self, series_id: MovieId, season: u32) -> AppResult<SeasonDetails>;

    /// Absolute URL of a poster or backdrop path
    fn image_url(&self, path: &str) -> String;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_slug(category.slug()), Some(category));
        }
        assert_eq!(Category::from_slug("westerns"), None);
    }

    #[test]
    fn test_genre_rows_use_discover() {
        let (path, query) = Category::Romance.request();
        assert_eq!(path, "/discover/movie");
        assert_eq!(query, vec![("with_genres", "10749".to_string())]);
    }

    #[test]
    fn test_originals_row_filters_by_network() {
        let (path, query) = Category::Originals.request();
        assert_eq!(path, "/discover/tv");
        assert_eq!(query, vec![("with_networks", "213".to_string())]);
        assert_eq!(Category::Originals.default_kind(), MediaKind::Tv);
    }

    #[test]
    fn test_fixed_rows_have_no_extra_query() {
        assert_eq!(Category::Trending.request(), ("/trending/all/week", vec![]));
        assert_eq!(Category::TopRated.request(), ("/movie/top_rated", vec![]));
    }
}
