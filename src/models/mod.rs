use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod favorite;
pub mod identity;

pub use favorite::{FavoriteRecord, Membership, MovieId, NewFavorite, UserId};
pub use identity::{Identity, Session, SessionState};

/// Kind of catalog item, as used in TMDB paths and player URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// Parses a provider `media_type` value; anything else (e.g. "person") is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            _ => None,
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Denormalized copy of a catalog item, stored alongside a favorite
///
/// Holds only the display fields the Vault page reads, so bookmarks render
/// without a second metadata fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSnapshot {
    pub id: MovieId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl MediaSnapshot {
    /// Movies carry `title`, series carry `name`
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Untitled")
    }

    /// Explicit `media_type` wins; otherwise a first air date marks a series
    pub fn kind(&self) -> MediaKind {
        match self.media_type {
            Some(kind) => kind,
            None if self.first_air_date.is_some() => MediaKind::Tv,
            None => MediaKind::Movie,
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// One entry of a TMDB list response (trending, discover, search, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl From<&CatalogItem> for MediaSnapshot {
    fn from(item: &CatalogItem) -> Self {
        MediaSnapshot {
            id: item.id,
            title: item.title.clone(),
            name: item.name.clone(),
            poster_path: item.poster_path.clone(),
            backdrop_path: item.backdrop_path.clone(),
            media_type: item.media_type.as_deref().and_then(MediaKind::parse),
            first_air_date: item.first_air_date.clone(),
            release_date: item.release_date.clone(),
            overview: item.overview.clone(),
        }
    }
}

/// Paged list envelope used by every TMDB list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episode_count: Option<u32>,
}

/// Raw video entry from `append_to_response=videos`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

/// Raw TMDB detail response for `/movie/{id}` or `/tv/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDetails {
    pub id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
    #[serde(default)]
    pub videos: Option<TmdbVideos>,
}

/// Title details returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetails {
    pub id: MovieId,
    pub kind: MediaKind,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub vote_average: Option<f64>,
    pub genres: Vec<Genre>,
    pub number_of_seasons: Option<u32>,
    pub seasons: Vec<SeasonSummary>,
    /// YouTube key of the first trailer, if TMDB lists one
    pub trailer_key: Option<String>,
}

impl TitleDetails {
    pub fn from_tmdb(kind: MediaKind, details: TmdbDetails) -> Self {
        let trailer_key = details.videos.as_ref().and_then(|videos| {
            videos
                .results
                .iter()
                .find(|v| v.site == "YouTube" && v.video_type == "Trailer")
                .map(|v| v.key.clone())
        });

        let title = details
            .title
            .or(details.name)
            .unwrap_or_else(|| "Untitled".to_string());

        TitleDetails {
            id: details.id,
            kind,
            title,
            overview: details.overview,
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            release_date: details.release_date.or(details.first_air_date),
            runtime: details.runtime,
            vote_average: details.vote_average,
            genres: details.genres,
            number_of_seasons: details.number_of_seasons,
            seasons: details
                .seasons
                .into_iter()
                .filter(|s| s.season_number > 0)
                .collect(),
            trailer_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub episode_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub still_path: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
}

/// Raw TMDB response for `/tv/{id}/season/{n}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonDetails {
    pub season_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}
