//! Remote persistence of favorites
//!
//! The `favorites` relation lives in a hosted row store. Each operation is
//! atomic for its own row only; nothing here spans several records.

use crate::{
    error::AppResult,
    models::{FavoriteRecord, MovieId, NewFavorite, UserId},
};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryFavorites;
pub use supabase::SupabaseFavorites;

/// Row-store operations the favorites store depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// All favorites of `user_id`, newest first
    async fn select_all(&self, user_id: &UserId) -> AppResult<Vec<FavoriteRecord>>;

    /// Inserts one row and returns it as stored (with `created_at`)
    async fn insert(&self, favorite: NewFavorite) -> AppResult<FavoriteRecord>;

    /// Deletes the row keyed by `(user_id, movie_id)`
    async fn delete(&self, user_id: &UserId, movie_id: MovieId) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
