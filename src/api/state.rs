use std::sync::Arc;

use crate::{
    cache::{Cache, CacheWriterHandle},
    config::Config,
    services::{
        identity::supabase::SupabaseAuth, AuthProvider, CatalogProvider, FavoritesListener,
        FavoritesRepository, FavoritesStore, ListenerHandle, PlaybackService, RetryPolicy,
        SessionContext, SupabaseFavorites, TmdbProvider,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: SessionContext,
    pub auth: Arc<dyn AuthProvider>,
    pub favorites: Arc<FavoritesStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub playback: PlaybackService,
}

impl AppState {
    pub fn new(
        session: SessionContext,
        auth: Arc<dyn AuthProvider>,
        favorites: Arc<FavoritesStore>,
        catalog: Arc<dyn CatalogProvider>,
        playback: PlaybackService,
    ) -> Self {
        Self {
            session,
            auth,
            favorites,
            catalog,
            playback,
        }
    }

    /// Wires the hosted backends from configuration
    ///
    /// Spawns the catalog cache writer; the returned handle flushes it.
    pub fn from_config(config: &Config) -> (Self, CacheWriterHandle) {
        let session = SessionContext::new();
        let (cache, cache_handle) = Cache::new();

        let auth = Arc::new(SupabaseAuth::from_config(config, session.clone()));
        let repository: Arc<dyn FavoritesRepository> =
            Arc::new(SupabaseFavorites::from_config(config, session.clone()));
        let favorites = Arc::new(FavoritesStore::new(
            repository,
            RetryPolicy::from_config(config),
        ));
        let catalog = Arc::new(TmdbProvider::from_config(config, cache));

        let state = Self::new(
            session,
            auth,
            favorites,
            catalog,
            PlaybackService::from_config(config),
        );

        (state, cache_handle)
    }

    /// Starts keeping the favorites in step with the session
    pub fn spawn_favorites_listener(&self) -> ListenerHandle {
        FavoritesListener::new(self.favorites.clone(), self.session.clone()).spawn()
    }
}
