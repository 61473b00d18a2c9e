use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Supabase project URL (auth and row store)
    pub supabase_url: String,

    /// Supabase anonymous (public) API key
    pub supabase_anon_key: String,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL prepended to poster and backdrop paths
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Language sent with every TMDB request
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Embeddable player base URL
    #[serde(default = "default_player_base_url")]
    pub player_base_url: String,

    /// Where the sign-up confirmation email sends the user
    #[serde(default)]
    pub signup_redirect_url: Option<String>,

    /// Where the password recovery email sends the user
    #[serde(default)]
    pub recovery_redirect_url: Option<String>,

    /// Refresh token of a previous session, resumed at boot
    #[serde(default)]
    pub session_refresh_token: Option<String>,

    /// Deadline for a single remote call, in milliseconds
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,

    /// Total attempts for a remote read (first try included)
    #[serde(default = "default_read_retry_attempts")]
    pub read_retry_attempts: u32,

    /// Delay before the first read retry; doubles on each retry
    #[serde(default = "default_read_retry_base_delay_ms")]
    pub read_retry_base_delay_ms: u64,

    /// How long catalog responses stay cached, in seconds
    #[serde(default = "default_catalog_cache_ttl_secs")]
    pub catalog_cache_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_player_base_url() -> String {
    "https://vidsrc.to/embed".to_string()
}

fn default_remote_timeout_ms() -> u64 {
    10_000
}

fn default_read_retry_attempts() -> u32 {
    3
}

fn default_read_retry_base_delay_ms() -> u64 {
    250
}

fn default_catalog_cache_ttl_secs() -> u64 {
    3600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn catalog_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_cache_ttl_secs)
    }
}
