//! Favorites sync: the per-session saved set and the session listener

pub mod inflight;
pub mod listener;
pub mod store;

pub use listener::{FavoritesListener, ListenerHandle};
pub use store::{FavoritesStore, LoadOutcome, ToggleOutcome};
