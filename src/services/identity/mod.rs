//! Session and identity plumbing
//!
//! `SessionContext` is the explicit, injectable holder of the current session.
//! Anything that needs to know who is signed in takes a clone of it and either
//! reads the current value or subscribes to changes. `AuthProvider`
//! implementations are the only writers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{
    error::AppResult,
    models::{Identity, Session, SessionState, UserId},
};

pub mod supabase;

/// Which sessions a sign-out terminates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignOutScope {
    /// Only this session
    #[default]
    Local,
    /// Every session of the account
    Global,
}

impl SignOutScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignOutScope::Local => "local",
            SignOutScope::Global => "global",
        }
    }
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The provider requires email confirmation before the first sign-in
    ConfirmationSent,
    /// The account was auto-confirmed and a session opened
    SignedIn(Identity),
}

/// Shared, observable session state
#[derive(Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Creates an uninitialized, signed-out context
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().session.as_ref().map(|s| s.identity.clone())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.tx.borrow().user_id().cloned()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().session.as_ref().map(|s| s.access_token.clone())
    }

    pub fn is_recovery(&self) -> bool {
        self.tx
            .borrow()
            .session
            .as_ref()
            .map(|s| s.recovery)
            .unwrap_or(false)
    }

    /// Receives every session change: sign-in, sign-out and token refresh
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Stores a new or refreshed session; also completes initialization
    pub fn set_session(&self, session: Session) {
        tracing::debug!(user_id = %session.identity.user_id, "Session updated");
        self.tx.send_modify(|state| {
            state.initialized = true;
            state.session = Some(session);
        });
    }

    /// Drops the session; also completes initialization
    pub fn clear(&self) {
        self.tx.send_modify(|state| {
            state.initialized = true;
            state.session = None;
        });
    }

    /// Marks the initial session lookup as finished without changing the session
    pub fn mark_initialized(&self) {
        self.tx.send_if_modified(|state| {
            if state.initialized {
                false
            } else {
                state.initialized = true;
                true
            }
        });
    }

    /// Resolves once the initial session lookup has finished
    pub async fn wait_initialized(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|state| state.initialized).await;
    }
}

/// Auth provider capabilities consumed by the HTTP layer
///
/// Implementations keep the `SessionContext` they were built with in sync
/// with every successful call.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Registers an account; may require email confirmation
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<SignUpOutcome>;

    /// Opens a session with email and password
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;

    /// Ends the session locally and, for `Global`, on every device
    async fn sign_out(&self, scope: SignOutScope) -> AppResult<()>;

    /// Re-establishes a session from a stored refresh token
    async fn restore_session(&self, refresh_token: &str) -> AppResult<Identity>;

    /// Adopts the tokens carried by a password recovery link
    async fn open_recovery_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> AppResult<Identity>;

    /// Exchanges the current refresh token for a new access token
    async fn refresh(&self) -> AppResult<Identity>;

    /// Changes the password of the signed-in account
    ///
    /// Outside a recovery session the current password is verified first.
    async fn update_password(
        &self,
        current_password: Option<String>,
        new_password: &str,
    ) -> AppResult<()>;

    /// Sends a password recovery email
    async fn reset_password(&self, email: &str) -> AppResult<()>;

    fn name(&self) -> &'static str;
}
