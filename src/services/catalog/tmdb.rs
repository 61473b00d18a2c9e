//! TMDB metadata provider
//!
//! Every request carries the API key and language as query parameters.
//! Responses are cached by `CacheKey`; misses go through the shared read
//! retry policy.

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    cache::{Cache, CacheKey},
    cached,
    config::Config,
    error::{AppError, AppResult},
    models::{CatalogItem, MediaKind, MovieId, SeasonDetails, TitleDetails, TmdbDetails, TmdbPage},
    services::{
        catalog::{Category, CatalogProvider},
        retry::{with_retry, RetryPolicy},
    },
};

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
const SEARCH_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    image_base_url: String,
    cache: Cache,
    cache_ttl: Duration,
    policy: RetryPolicy,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            cache,
            cache_ttl: DEFAULT_CACHE_TTL,
            policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &Config, cache: Cache) -> Self {
        Self {
            language: config.tmdb_language.clone(),
            image_base_url: config.tmdb_image_base_url.trim_end_matches('/').to_string(),
            cache_ttl: config.catalog_cache_ttl(),
            policy: RetryPolicy::from_config(config),
            ..Self::new(cache, config.tmdb_api_key.clone(), config.tmdb_api_url.clone())
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// GETs `path` and decodes the JSON body
    ///
    /// 404 maps to `NotFound`; any other failure status is an `ExternalApi`
    /// error and therefore retried.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB has no resource at {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                response = %response_text,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }

    /// Rows show movies and series only; people never appear there
    fn keep_search_result(item: &CatalogItem) -> bool {
        let is_title = item
            .media_type
            .as_deref()
            .map(|kind| MediaKind::parse(kind).is_some())
            .unwrap_or(true);
        is_title && item.poster_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn fetch_category(&self, category: Category) -> AppResult<Vec<CatalogItem>> {
        cached!(
            self.cache,
            CacheKey::Category(category.slug().to_string()),
            self.cache_ttl,
            async move {
                let (path, params) = category.request();
                let page: TmdbPage<CatalogItem> =
                    with_retry(&self.policy, "tmdb.fetch_category", || {
                        self.get_json(path, &params)
                    })
                    .await?;

                let items: Vec<CatalogItem> = page
                    .results
                    .into_iter()
                    .map(|mut item| {
                        if item.media_type.is_none() {
                            item.media_type = Some(category.default_kind().as_str().to_string());
                        }
                        item
                    })
                    .collect();

                tracing::info!(
                    category = %category,
                    count = items.len(),
                    "Fetched catalog row from TMDB"
                );

                Ok::<_, AppError>(items)
            }
        )
    }

    async fn search(&self, query: &str) -> AppResult<Vec<CatalogItem>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(query.to_string()),
            SEARCH_CACHE_TTL.min(self.cache_ttl),
            async move {
                let params = [
                    ("query", query.to_string()),
                    ("include_adult", "false".to_string()),
                ];
                let page: TmdbPage<CatalogItem> = with_retry(&self.policy, "tmdb.search", || {
                    self.get_json("/search/multi", &params)
                })
                .await?;

                let total = page.results.len();
                let items: Vec<CatalogItem> = page
                    .results
                    .into_iter()
                    .filter(Self::keep_search_result)
                    .collect();

                tracing::info!(
                    query = %query,
                    count = items.len(),
                    dropped = total - items.len(),
                    "Searched TMDB"
                );

                Ok::<_, AppError>(items)
            }
        )
    }

    async fn fetch_details(&self, kind: MediaKind, id: MovieId) -> AppResult<TitleDetails> {
        cached!(
            self.cache,
            CacheKey::Details(kind, id),
            self.cache_ttl,
            async move {
                let path = format!("/{}/{}", kind, id);
                let params = [("append_to_response", "videos".to_string())];
                let details: TmdbDetails = with_retry(&self.policy, "tmdb.fetch_details", || {
                    self.get_json(&path, &params)
                })
                .await?;

                let details = TitleDetails::from_tmdb(kind, details);
                tracing::debug!(
                    kind = %kind,
                    id = %id,
                    has_trailer = details.trailer_key.is_some(),
                    "Fetched title details from TMDB"
                );

                Ok::<_, AppError>(details)
            }
        )
    }

    async fn fetch_season(&self, series_id: MovieId, season: u32) -> AppResult<SeasonDetails> {
        if season == 0 {
            return Err(AppError::InvalidInput(
                "Season numbers start at 1".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Season(series_id, season),
            self.cache_ttl,
            async move {
                let path = format!("/tv/{}/season/{}", series_id, season);
                let details: SeasonDetails = with_retry(&self.policy, "tmdb.fetch_season", || {
                    self.get_json(&path, &[])
                })
                .await?;

                tracing::debug!(
                    series_id = %series_id,
                    season,
                    episodes = details.episodes.len(),
                    "Fetched season from TMDB"
                );

                Ok::<_, AppError>(details)
            }
        )
    }

    fn image_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.image_base_url, path)
        } else {
            format!("{}/{}", self.image_base_url, path)
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider(cache: Cache) -> TmdbProvider {
        // Unroutable: any request that escapes the cache fails fast
        TmdbProvider::new(cache, "test_key".to_string(), "http://127.0.0.1:9/3/".to_string())
            .with_policy(RetryPolicy::once(Duration::from_secs(2)))
    }

    fn item(json: &str) -> CatalogItem {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_image_url() {
        let (cache, _handle) = Cache::new();
        let provider = create_test_provider(cache);
        assert_eq!(
            provider.image_url("/abc.jpg"),
            "https://image.tmdb.org/t/p/original/abc.jpg"
        );
        assert_eq!(
            provider.image_url("abc.jpg"),
            "https://image.tmdb.org/t/p/original/abc.jpg"
        );
        assert_eq!(provider.api_url, "http://127.0.0.1:9/3");
    }

    #[tokio::test]
    async fn test_empty_search_is_rejected() {
        let (cache, _handle) = Cache::new();
        let provider = create_test_provider(cache);
        let result = provider.search("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_season_zero_is_rejected() {
        let (cache, _handle) = Cache::new();
        let provider = create_test_provider(cache);
        let result = provider.fetch_season(MovieId(1396), 0).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_search_filter_drops_people_and_posterless() {
        assert!(TmdbProvider::keep_search_result(&item(
            r#"{"id": 1, "title": "Dune", "media_type": "movie", "poster_path": "/d.jpg"}"#
        )));
        assert!(!TmdbProvider::keep_search_result(&item(
            r#"{"id": 2, "title": "Dune", "media_type": "movie", "poster_path": null}"#
        )));
        assert!(!TmdbProvider::keep_search_result(&item(
            r#"{"id": 3, "name": "Zendaya", "media_type": "person", "poster_path": "/z.jpg"}"#
        )));
    }

    #[tokio::test]
    async fn test_cached_row_skips_network() {
        let (cache, _handle) = Cache::new();
        let rows = vec![item(r#"{"id": 603, "title": "The Matrix", "media_type": "movie"}"#)];
        cache.set_in_background(
            &CacheKey::Category("top_rated".to_string()),
            &rows,
            Duration::from_secs(60),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        let provider = create_test_provider(cache);
        let fetched = provider.fetch_category(Category::TopRated).await.unwrap();
        assert_eq!(fetched, rows);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_an_error() {
        let (cache, _handle) = Cache::new();
        let provider = create_test_provider(cache);
        let result = provider.fetch_details(MediaKind::Movie, MovieId(603)).await;
        assert!(matches!(
            result,
            Err(AppError::HttpClient(_)) | Err(AppError::Timeout(_))
        ));
    }
}
