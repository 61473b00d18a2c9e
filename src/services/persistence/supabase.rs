//! Supabase PostgREST backend for the `favorites` relation
//!
//! Requests carry the project anon key plus the signed-in user's access token,
//! so row-level security on the relation sees the right user.

use reqwest::{Client as HttpClient, RequestBuilder, Response};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{FavoriteRecord, MovieId, NewFavorite, UserId},
    services::{identity::SessionContext, persistence::FavoritesRepository},
};

const FAVORITES_TABLE: &str = "favorites";

#[derive(Clone)]
pub struct SupabaseFavorites {
    http_client: HttpClient,
    table_url: String,
    anon_key: String,
    session: SessionContext,
}

impl SupabaseFavorites {
    pub fn new(session: SessionContext, supabase_url: String, anon_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            table_url: format!(
                "{}/rest/v1/{}",
                supabase_url.trim_end_matches('/'),
                FAVORITES_TABLE
            ),
            anon_key,
            session,
        }
    }

    pub fn from_config(config: &Config, session: SessionContext) -> Self {
        Self::new(
            session,
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> AppResult<RequestBuilder> {
        let token = self.session.access_token().ok_or(AppError::Unauthenticated)?;
        Ok(builder.header("apikey", &self.anon_key).bearer_auth(token))
    }

    /// PostgREST equality filter value
    fn eq(value: impl std::fmt::Display) -> String {
        format!("eq.{}", value)
    }

    async fn error_body(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("Row store returned status {}: {}", status, body)
    }
}

#[async_trait::async_trait]
impl FavoritesRepository for SupabaseFavorites {
    async fn select_all(&self, user_id: &UserId) -> AppResult<Vec<FavoriteRecord>> {
        let builder = self.authorized(self.http_client.get(&self.table_url))?.query(&[
            ("select", "*".to_string()),
            ("user_id", Self::eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ]);

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::RemoteRead(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::RemoteRead(Self::error_body(response).await));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::RemoteRead(e.to_string()))?;

        let records: Vec<FavoriteRecord> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize favorites rows"
            );
            AppError::RemoteRead(format!("Failed to parse favorites rows: {}", e))
        })?;

        tracing::debug!(user_id = %user_id, rows = records.len(), "Favorites selected");
        Ok(records)
    }

    async fn insert(&self, favorite: NewFavorite) -> AppResult<FavoriteRecord> {
        let builder = self
            .authorized(self.http_client.post(&self.table_url))?
            .header("Prefer", "return=representation")
            .json(&[&favorite]);

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::RemoteWrite(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::RemoteWrite(Self::error_body(response).await));
        }

        let mut rows: Vec<FavoriteRecord> = response
            .json()
            .await
            .map_err(|e| AppError::RemoteWrite(format!("Failed to parse inserted row: {}", e)))?;

        if rows.is_empty() {
            return Err(AppError::RemoteWrite(
                "Row store returned no inserted row".to_string(),
            ));
        }

        tracing::debug!(
            user_id = %favorite.user_id,
            movie_id = %favorite.movie_id,
            "Favorite inserted"
        );
        Ok(rows.swap_remove(0))
    }

    async fn delete(&self, user_id: &UserId, movie_id: MovieId) -> AppResult<()> {
        let builder = self
            .authorized(self.http_client.delete(&self.table_url))?
            .query(&[
                ("user_id", Self::eq(user_id)),
                ("movie_id", Self::eq(movie_id)),
            ]);

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::RemoteWrite(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::RemoteWrite(Self::error_body(response).await));
        }

        tracing::debug!(user_id = %user_id, movie_id = %movie_id, "Favorite deleted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
