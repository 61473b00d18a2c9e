//! Embeddable player and trailer URLs

use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{MediaKind, MovieId},
};

const YOUTUBE_EMBED_URL: &str = "https://www.youtube.com/embed";

/// What the player should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackTarget {
    Movie {
        id: MovieId,
    },
    Episode {
        series_id: MovieId,
        season: u32,
        episode: u32,
    },
}

impl PlaybackTarget {
    /// Series open at season 1, episode 1
    pub fn for_title(kind: MediaKind, id: MovieId) -> Self {
        match kind {
            MediaKind::Movie => PlaybackTarget::Movie { id },
            MediaKind::Tv => PlaybackTarget::Episode {
                series_id: id,
                season: 1,
                episode: 1,
            },
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            PlaybackTarget::Movie { .. } => MediaKind::Movie,
            PlaybackTarget::Episode { .. } => MediaKind::Tv,
        }
    }
}

/// Player URL plus what it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackLink {
    pub target: PlaybackTarget,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PlaybackService {
    player_base_url: String,
}

impl PlaybackService {
    pub fn new(player_base_url: impl Into<String>) -> Self {
        Self {
            player_base_url: player_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.player_base_url.clone())
    }

    pub fn player_url(&self, target: PlaybackTarget) -> AppResult<PlaybackLink> {
        let url = match target {
            PlaybackTarget::Movie { id } => format!("{}/movie/{}", self.player_base_url, id),
            PlaybackTarget::Episode {
                series_id,
                season,
                episode,
            } => {
                if season == 0 || episode == 0 {
                    return Err(AppError::InvalidInput(
                        "Season and episode numbers start at 1".to_string(),
                    ));
                }
                format!(
                    "{}/tv/{}/{}/{}",
                    self.player_base_url, series_id, season, episode
                )
            }
        };

        tracing::debug!(url = %url, "Built player URL");
        Ok(PlaybackLink { target, url })
    }

    /// Autoplaying YouTube embed without related videos
    pub fn trailer_url(&self, key: &str) -> AppResult<String> {
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(AppError::InvalidInput(format!("Invalid trailer key: {:?}", key)));
        }
        Ok(format!("{}/{}?autoplay=1&rel=0", YOUTUBE_EMBED_URL, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PlaybackService {
        PlaybackService::new("https://player.example/embed/")
    }

    #[test]
    fn test_movie_url() {
        let link = tokio_test::assert_ok!(
            service().player_url(PlaybackTarget::Movie { id: MovieId(603) })
        );
        assert_eq!(link.url, "https://player.example/embed/movie/603");
    }

    #[test]
    fn test_episode_url() {
        let link = service()
            .player_url(PlaybackTarget::Episode {
                series_id: MovieId(1396),
                season: 2,
                episode: 5,
            })
            .unwrap();
        assert_eq!(link.url, "https://player.example/embed/tv/1396/2/5");
    }

    #[test]
    fn test_zero_season_or_episode_rejected() {
        for (season, episode) in [(0, 1), (1, 0)] {
            let result = service().player_url(PlaybackTarget::Episode {
                series_id: MovieId(1396),
                season,
                episode,
            });
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_series_default_to_first_episode() {
        assert_eq!(
            PlaybackTarget::for_title(MediaKind::Tv, MovieId(1396)),
            PlaybackTarget::Episode {
                series_id: MovieId(1396),
                season: 1,
                episode: 1
            }
        );
        assert_eq!(
            PlaybackTarget::for_title(MediaKind::Movie, MovieId(603)).kind(),
            MediaKind::Movie
        );
    }

    #[test]
    fn test_trailer_url() {
        assert_eq!(
            service().trailer_url("dQw4w9WgXcQ").unwrap(),
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1&rel=0"
        );
        tokio_test::assert_err!(service().trailer_url(""));
        tokio_test::assert_err!(service().trailer_url("a/b?c"));
    }
}
