use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{FavoriteRecord, MediaSnapshot, Membership, MovieId, NewFavorite, UserId},
    services::{
        favorites::inflight::InFlight,
        persistence::FavoritesRepository,
        retry::{with_deadline, with_retry, RetryPolicy},
    },
};

/// Result of a completed `toggle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The remote insert succeeded and the id is now saved
    Added,
    /// The remote delete succeeded and the id is no longer saved
    Removed,
    /// The identity changed while the write was in flight; local state untouched
    Discarded,
}

/// Result of a completed `load_for_identity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum LoadOutcome {
    Applied { count: usize },
    /// A newer identity became current, or a newer load was already applied,
    /// before the rows arrived
    Discarded,
}

/// Favorites of the current identity
#[derive(Debug, Default)]
struct FavoritesState {
    identity: Option<UserId>,
    /// Bumped on every identity change; results started under an older
    /// generation are dropped
    generation: u64,
    loaded: bool,
    saved: HashSet<MovieId>,
    /// Newest first
    records: Vec<FavoriteRecord>,
    /// Bumped on every confirmed write
    write_seq: u64,
    /// Latest confirmed write per id, `None` for a delete. Replayed over
    /// loads whose rows may predate the write.
    confirmed: HashMap<MovieId, (u64, Option<FavoriteRecord>)>,
    /// `write_seq` observed by the start of the last applied load
    applied_seq: u64,
}

impl FavoritesState {
    fn switch_identity(&mut self, identity: Option<UserId>) {
        self.identity = identity;
        self.generation += 1;
        self.loaded = false;
        self.saved.clear();
        self.records.clear();
        self.confirmed.clear();
    }

    fn confirm(&mut self, movie_id: MovieId, record: Option<FavoriteRecord>) {
        self.write_seq += 1;
        self.confirmed.insert(movie_id, (self.write_seq, record));
    }

    /// Applies rows fetched by a load that started at `seen_seq`
    ///
    /// Returns false when a load that started later was already applied.
    fn apply_load(&mut self, mut records: Vec<FavoriteRecord>, seen_seq: u64) -> bool {
        if seen_seq < self.applied_seq {
            return false;
        }

        for (movie_id, (seq, record)) in &self.confirmed {
            if *seq > seen_seq {
                records.retain(|r| r.movie_id != *movie_id);
                records.extend(record.iter().cloned());
            }
        }
        self.confirmed.retain(|_, (seq, _)| *seq > seen_seq);
        self.applied_seq = seen_seq;

        self.replace(records);
        true
    }

    fn replace(&mut self, mut records: Vec<FavoriteRecord>) {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut saved = HashSet::with_capacity(records.len());
        records.retain(|r| saved.insert(r.movie_id));

        self.saved = saved;
        self.records = records;
        self.loaded = true;
    }
}

/// Per-session view of the user's bookmarked titles
///
/// Local state only changes after the row store confirms a write. Toggles on
/// the same id are serialized; toggles on different ids run concurrently.
pub struct FavoritesStore {
    repository: Arc<dyn FavoritesRepository>,
    state: RwLock<FavoritesState>,
    in_flight: InFlight<MovieId>,
    read_policy: RetryPolicy,
    write_policy: RetryPolicy,
}

impl FavoritesStore {
    pub fn new(repository: Arc<dyn FavoritesRepository>, read_policy: RetryPolicy) -> Self {
        Self {
            repository,
            state: RwLock::new(FavoritesState::default()),
            in_flight: InFlight::new(),
            write_policy: RetryPolicy::once(read_policy.timeout),
            read_policy,
        }
    }

    /// Makes `identity` current; returns false if it already was
    ///
    /// Any change drops the local favorites and invalidates in-flight results.
    pub async fn set_identity(&self, identity: Option<UserId>) -> bool {
        let mut state = self.state.write().await;
        if state.identity == identity {
            return false;
        }

        match &identity {
            Some(user_id) => tracing::info!(user_id = %user_id, "Favorites identity changed"),
            None => tracing::info!("Favorites cleared for anonymous session"),
        }
        state.switch_identity(identity);
        true
    }

    pub async fn identity(&self) -> Option<UserId> {
        self.state.read().await.identity.clone()
    }

    /// Fetches every favorite of `user_id` and replaces the local view
    ///
    /// `user_id` becomes the current identity if it was not already. On
    /// failure the previous local view is kept. Writes confirmed while the
    /// rows were in flight are kept on top of them.
    pub async fn load_for_identity(&self, user_id: UserId) -> AppResult<LoadOutcome> {
        let (generation, seen_seq) = {
            let mut state = self.state.write().await;
            if state.identity.as_ref() != Some(&user_id) {
                tracing::info!(user_id = %user_id, "Favorites identity changed");
                state.switch_identity(Some(user_id.clone()));
            }
            (state.generation, state.write_seq)
        };

        let repository = self.repository.clone();
        let result = with_retry(&self.read_policy, "favorites.select_all", || {
            let repository = repository.clone();
            let user_id = user_id.clone();
            async move { repository.select_all(&user_id).await }
        })
        .await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(user_id = %user_id, "Discarding favorites load for stale identity");
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(records) => {
                if !state.apply_load(records, seen_seq) {
                    tracing::debug!(
                        user_id = %user_id,
                        "Discarding favorites load superseded by a newer one"
                    );
                    return Ok(LoadOutcome::Discarded);
                }
                let count = state.records.len();
                tracing::info!(
                    user_id = %user_id,
                    count,
                    backend = self.repository.name(),
                    "Favorites loaded"
                );
                Ok(LoadOutcome::Applied { count })
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Favorites load failed");
                Err(match e {
                    AppError::RemoteRead(_) | AppError::Timeout(_) | AppError::Unauthenticated => e,
                    other => AppError::RemoteRead(other.to_string()),
                })
            }
        }
    }

    /// Reloads the current identity's favorites, if any
    pub async fn refresh(&self) -> AppResult<LoadOutcome> {
        let user_id = self.identity().await.ok_or(AppError::Unauthenticated)?;
        self.load_for_identity(user_id).await
    }

    /// Saves `movie_id` if it is not saved, removes it if it is
    ///
    /// Requires an identity. Waits for any earlier toggle of the same id, then
    /// issues exactly one remote write and applies it locally on success.
    pub async fn toggle(&self, movie_id: MovieId, snapshot: MediaSnapshot) -> AppResult<ToggleOutcome> {
        if snapshot.id != movie_id {
            return Err(AppError::InvalidInput(format!(
                "Snapshot id {} does not match movie id {}",
                snapshot.id, movie_id
            )));
        }
        if self.state.read().await.identity.is_none() {
            return Err(AppError::Unauthenticated);
        }

        let _guard = self.in_flight.acquire(movie_id).await;

        let (user_id, generation, currently_saved) = {
            let state = self.state.read().await;
            let user_id = state.identity.clone().ok_or(AppError::Unauthenticated)?;
            (user_id, state.generation, state.saved.contains(&movie_id))
        };

        let timeout = self.write_policy.timeout;
        let write = if currently_saved {
            with_deadline(timeout, self.repository.delete(&user_id, movie_id))
                .await
                .map(|()| None)
        } else {
            let favorite = NewFavorite {
                user_id: user_id.clone(),
                movie_id,
                movie_data: snapshot,
            };
            with_deadline(timeout, self.repository.insert(favorite))
                .await
                .map(Some)
        };

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                user_id = %user_id,
                movie_id = %movie_id,
                "Discarding favorite write result for stale identity"
            );
            return Ok(ToggleOutcome::Discarded);
        }

        match write {
            Ok(None) => {
                state.confirm(movie_id, None);
                state.saved.remove(&movie_id);
                state.records.retain(|r| r.movie_id != movie_id);
                tracing::info!(user_id = %user_id, movie_id = %movie_id, "Favorite removed");
                Ok(ToggleOutcome::Removed)
            }
            Ok(Some(record)) => {
                state.confirm(movie_id, Some(record.clone()));
                state.saved.insert(movie_id);
                state.records.retain(|r| r.movie_id != movie_id);
                state.records.insert(0, record);
                tracing::info!(user_id = %user_id, movie_id = %movie_id, "Favorite added");
                Ok(ToggleOutcome::Added)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    movie_id = %movie_id,
                    removing = currently_saved,
                    error = %e,
                    "Favorite write failed, local state unchanged"
                );
                Err(match e {
                    AppError::RemoteWrite(_) | AppError::Timeout(_) | AppError::Unauthenticated => e,
                    other => AppError::RemoteWrite(other.to_string()),
                })
            }
        }
    }

    /// Local membership check; "not saved" until a load completes
    pub async fn is_saved(&self, movie_id: MovieId) -> bool {
        self.state.read().await.saved.contains(&movie_id)
    }

    pub async fn membership(&self, movie_id: MovieId) -> Membership {
        let state = self.state.read().await;
        if !state.loaded {
            Membership::Unknown
        } else if state.saved.contains(&movie_id) {
            Membership::Saved
        } else {
            Membership::NotSaved
        }
    }

    /// Saved ids of the current identity
    pub async fn saved_ids(&self) -> HashSet<MovieId> {
        self.state.read().await.saved.clone()
    }

    /// Bookmark list, newest first
    pub async fn list(&self) -> Vec<FavoriteRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.loaded
    }

    /// Whether a toggle of `movie_id` is running or queued
    pub fn is_pending(&self, movie_id: MovieId) -> bool {
        self.in_flight.is_pending(&movie_id)
    }
}
