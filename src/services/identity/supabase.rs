//! Supabase Auth (GoTrue) client
//!
//! Talks to `{supabase_url}/auth/v1` with the project's anon key and mirrors
//! every session change into the shared `SessionContext`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Identity, Session},
    services::{
        identity::{AuthProvider, SessionContext, SignOutScope, SignUpOutcome},
        retry::with_deadline,
    },
};

/// Shortest password the auth provider accepts
const MIN_PASSWORD_LEN: usize = 6;

/// Token grant response (`/token`, auto-confirmed `/signup`)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self, recovery: bool) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            });

        Session {
            identity: self.user,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            recovery,
        }
    }
}

/// GoTrue reports errors under a handful of different keys
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AuthErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Clone)]
pub struct SupabaseAuth {
    http_client: HttpClient,
    api_url: String,
    anon_key: String,
    session: SessionContext,
    signup_redirect_url: Option<String>,
    recovery_redirect_url: Option<String>,
    timeout: Duration,
}

impl SupabaseAuth {
    pub fn new(session: SessionContext, supabase_url: String, anon_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            anon_key,
            session,
            signup_redirect_url: None,
            recovery_redirect_url: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(config: &Config, session: SessionContext) -> Self {
        Self {
            signup_redirect_url: config.signup_redirect_url.clone(),
            recovery_redirect_url: config.recovery_redirect_url.clone(),
            timeout: config.remote_timeout(),
            ..Self::new(
                session,
                config.supabase_url.clone(),
                config.supabase_anon_key.clone(),
            )
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    fn bearer(&self) -> AppResult<String> {
        self.session.access_token().ok_or(AppError::Unauthenticated)
    }

    /// Turns a non-success response into an `AppError`
    async fn check(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AuthErrorBody>(&body)
            .ok()
            .and_then(AuthErrorBody::into_message)
            .unwrap_or_else(|| format!("Auth API returned status {}", status));

        if status.is_client_error() {
            Err(AppError::Auth(message))
        } else {
            Err(AppError::ExternalApi(format!(
                "Auth API returned status {}: {}",
                status, message
            )))
        }
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        with_deadline(self.timeout, async {
            let response = self.request(builder).send().await?;
            Self::check(response).await
        })
        .await
    }

    async fn grant(&self, grant_type: &str, body: serde_json::Value) -> AppResult<TokenResponse> {
        let builder = self
            .http_client
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);

        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }

    async fn password_grant(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        self.grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn refresh_grant(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        self.grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AppError::InvalidInput("A valid email is required".to_string()));
        }
        Self::validate_password(password)
    }

    fn validate_password(password: &str) -> AppResult<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<SignUpOutcome> {
        Self::validate_credentials(email, password)?;

        let mut builder = self
            .http_client
            .post(self.endpoint("signup"))
            .json(&json!({ "email": email, "password": password }));
        if let Some(redirect) = &self.signup_redirect_url {
            builder = builder.query(&[("redirect_to", redirect.as_str())]);
        }

        let body: serde_json::Value = self.send(builder).await?.json().await?;

        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
                AppError::ExternalApi(format!("Failed to parse sign-up session: {}", e))
            })?;
            let session = token.into_session(false);
            let identity = session.identity.clone();
            self.session.set_session(session);

            tracing::info!(user_id = %identity.user_id, "Signed up and signed in");
            Ok(SignUpOutcome::SignedIn(identity))
        } else {
            tracing::info!("Sign-up confirmation email sent");
            Ok(SignUpOutcome::ConfirmationSent)
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let session = self.password_grant(email, password).await?.into_session(false);
        let identity = session.identity.clone();
        self.session.set_session(session);

        tracing::info!(user_id = %identity.user_id, "Signed in");
        Ok(identity)
    }

    async fn sign_out(&self, scope: SignOutScope) -> AppResult<()> {
        let Some(token) = self.session.access_token() else {
            self.session.clear();
            return Ok(());
        };

        let builder = self
            .http_client
            .post(self.endpoint("logout"))
            .query(&[("scope", scope.as_str())])
            .bearer_auth(token);
        let result = self.send(builder).await.map(|_| ());

        // The local session ends even when the provider call fails.
        self.session.clear();

        match &result {
            Ok(()) => tracing::info!(scope = scope.as_str(), "Signed out"),
            Err(e) => tracing::warn!(scope = scope.as_str(), error = %e, "Remote sign-out failed"),
        }
        result
    }

    async fn restore_session(&self, refresh_token: &str) -> AppResult<Identity> {
        match self.refresh_grant(refresh_token).await {
            Ok(token) => {
                let session = token.into_session(false);
                let identity = session.identity.clone();
                self.session.set_session(session);
                tracing::info!(user_id = %identity.user_id, "Session restored");
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session restore failed, continuing signed out");
                self.session.clear();
                Err(e)
            }
        }
    }

    async fn open_recovery_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> AppResult<Identity> {
        let builder = self
            .http_client
            .get(self.endpoint("user"))
            .bearer_auth(access_token);
        let identity: Identity = self.send(builder).await?.json().await?;

        self.session.set_session(Session {
            identity: identity.clone(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: None,
            recovery: true,
        });

        tracing::info!(user_id = %identity.user_id, "Recovery session opened");
        Ok(identity)
    }

    async fn refresh(&self) -> AppResult<Identity> {
        let current = self.session.current().session.ok_or(AppError::Unauthenticated)?;

        let session = self
            .refresh_grant(&current.refresh_token)
            .await?
            .into_session(current.recovery);
        let identity = session.identity.clone();
        self.session.set_session(session);

        tracing::debug!(user_id = %identity.user_id, "Access token refreshed");
        Ok(identity)
    }

    async fn update_password(
        &self,
        current_password: Option<String>,
        new_password: &str,
    ) -> AppResult<()> {
        Self::validate_password(new_password)?;
        let identity = self.session.identity().ok_or(AppError::Unauthenticated)?;

        if !self.session.is_recovery() {
            let current = current_password.ok_or_else(|| {
                AppError::InvalidInput("Current password is required".to_string())
            })?;
            let email = identity.email.as_deref().ok_or_else(|| {
                AppError::Auth("Account has no email to verify against".to_string())
            })?;

            let verified = self.password_grant(email, &current).await.map_err(|e| match e {
                AppError::Auth(_) => AppError::Auth("Current password is incorrect".to_string()),
                other => other,
            })?;
            self.session.set_session(verified.into_session(false));
        }

        let builder = self
            .http_client
            .put(self.endpoint("user"))
            .bearer_auth(self.bearer()?)
            .json(&json!({ "password": new_password }));
        self.send(builder).await?;

        if let Some(mut session) = self.session.current().session {
            if session.recovery {
                session.recovery = false;
                self.session.set_session(session);
            }
        }

        tracing::info!(user_id = %identity.user_id, "Password updated");
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> AppResult<()> {
        if email.trim().is_empty() {
            return Err(AppError::InvalidInput("Email is required".to_string()));
        }

        let mut builder = self
            .http_client
            .post(self.endpoint("recover"))
            .json(&json!({ "email": email }));
        if let Some(redirect) = &self.recovery_redirect_url {
            builder = builder.query(&[("redirect_to", redirect.as_str())]);
        }

        self.send(builder).await?;
        tracing::info!("Password recovery email requested");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    fn create_test_auth() -> SupabaseAuth {
        SupabaseAuth::new(
            SessionContext::new(),
            "https://demo.supabase.co/".to_string(),
            "anon".to_string(),
        )
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let auth = create_test_auth();
        assert_eq!(auth.endpoint("token"), "https://demo.supabase.co/auth/v1/token");
    }

    #[test]
    fn test_token_response_into_session() {
        let json = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700000000,
            "refresh_token": "r1",
            "user": {"id": "u1", "email": "a@b.co", "created_at": "2024-01-02T03:04:05Z"}
        }"#;

        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let session = token.into_session(false);
        assert_eq!(session.identity.user_id, UserId::new("u1"));
        assert_eq!(session.identity.email.as_deref(), Some("a@b.co"));
        assert_eq!(session.expires_at.unwrap().timestamp(), 1_700_000_000);
        assert!(!session.recovery);
    }

    #[test]
    fn test_error_body_prefers_description() {
        let body: AuthErrorBody = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        let body: AuthErrorBody =
            serde_json::from_str(r#"{"code": 422, "msg": "User already registered"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("User already registered"));
    }

    #[test]
    fn test_credential_validation() {
        assert!(SupabaseAuth::validate_credentials("a@b.co", "secret1").is_ok());
        assert!(matches!(
            SupabaseAuth::validate_credentials("not-an-email", "secret1"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            SupabaseAuth::validate_password("12345"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_without_session_only_clears() {
        let auth = create_test_auth();
        auth.sign_out(SignOutScope::Global).await.unwrap();
        assert!(auth.session.current().initialized);
        assert_eq!(auth.session.user_id(), None);
    }

    #[tokio::test]
    async fn test_update_password_requires_session() {
        let auth = create_test_auth();
        let result = auth.update_password(Some("old-pass".to_string()), "new-pass").await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }
}
