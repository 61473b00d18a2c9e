use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{FavoriteRecord, MovieId, NewFavorite, UserId},
    services::persistence::FavoritesRepository,
};

/// In-process `favorites` relation for local runs and tests
///
/// Enforces the same `(user_id, movie_id)` uniqueness the hosted relation does.
#[derive(Debug, Default)]
pub struct InMemoryFavorites {
    rows: Mutex<Vec<FavoriteRecord>>,
}

impl InMemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds rows as if they had been inserted earlier
    pub fn with_rows(rows: Vec<FavoriteRecord>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait::async_trait]
impl FavoritesRepository for InMemoryFavorites {
    async fn select_all(&self, user_id: &UserId) -> AppResult<Vec<FavoriteRecord>> {
        let rows = self.rows.lock().await;
        let mut records: Vec<FavoriteRecord> = rows
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn insert(&self, favorite: NewFavorite) -> AppResult<FavoriteRecord> {
        let mut rows = self.rows.lock().await;

        if rows
            .iter()
            .any(|r| r.user_id == favorite.user_id && r.movie_id == favorite.movie_id)
        {
            return Err(AppError::RemoteWrite(format!(
                "duplicate key value violates unique constraint (user_id, movie_id)=({}, {})",
                favorite.user_id, favorite.movie_id
            )));
        }

        let next_id = rows.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
        let record = FavoriteRecord {
            id: Some(next_id),
            user_id: favorite.user_id,
            movie_id: favorite.movie_id,
            movie_data: favorite.movie_data,
            created_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, user_id: &UserId, movie_id: MovieId) -> AppResult<()> {
        let mut rows = self.rows.lock().await;
        rows.retain(|r| !(&r.user_id == user_id && r.movie_id == movie_id));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
