pub mod catalog;
pub mod favorites;
pub mod identity;
pub mod persistence;
pub mod playback;
pub mod retry;

pub use catalog::{CatalogProvider, Category, TmdbProvider};
pub use favorites::{FavoritesListener, FavoritesStore, ListenerHandle, LoadOutcome, ToggleOutcome};
pub use identity::{AuthProvider, SessionContext, SignOutScope, SignUpOutcome};
pub use persistence::{FavoritesRepository, InMemoryFavorites, SupabaseFavorites};
pub use playback::{PlaybackLink, PlaybackService, PlaybackTarget};
pub use retry::RetryPolicy;
