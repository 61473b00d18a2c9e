use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// The signed-in account, as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "id")]
    pub user_id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// Opened from a password recovery link; password updates skip re-auth
    pub recovery: bool,
}

/// What session subscribers observe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Set once the initial session lookup has finished
    pub initialized: bool,
    pub session: Option<Session>,
}

impl SessionState {
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(|s| &s.identity.user_id)
    }
}
