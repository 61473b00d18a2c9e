//! HTTP surface: handlers per area plus the router that wires them

pub mod auth;
pub mod catalog;
pub mod favorites;
pub mod playback;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
