use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::Identity,
    services::{SignOutScope, SignUpOutcome},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignOutRequest {
    #[serde(default)]
    pub scope: SignOutScope,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverySessionRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpResponse {
    ConfirmationSent,
    SignedIn { identity: Identity },
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub initialized: bool,
    pub identity: Option<Identity>,
    pub recovery: bool,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<SignUpResponse>)> {
    let response = match state.auth.sign_up(&request.email, &request.password).await? {
        SignUpOutcome::ConfirmationSent => SignUpResponse::ConfirmationSent,
        SignUpOutcome::SignedIn(identity) => SignUpResponse::SignedIn { identity },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<Identity>> {
    let identity = state.auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(identity))
}

/// Body is optional; an empty request signs out this session only
pub async fn sign_out(
    State(state): State<AppState>,
    request: Option<Json<SignOutRequest>>,
) -> AppResult<StatusCode> {
    let scope = request.map(|Json(r)| r.scope).unwrap_or_default();
    state.auth.sign_out(scope).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh(State(state): State<AppState>) -> AppResult<Json<Identity>> {
    let identity = state.auth.refresh().await?;
    Ok(Json(identity))
}

pub async fn update_password(
    State(state): State<AppState>,
    Json(request): Json<UpdatePasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .auth
        .update_password(request.current_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recover(
    State(state): State<AppState>,
    Json(request): Json<RecoverRequest>,
) -> AppResult<StatusCode> {
    state.auth.reset_password(&request.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Opens the session carried by a password recovery link
pub async fn recovery_session(
    State(state): State<AppState>,
    Json(request): Json<RecoverySessionRequest>,
) -> AppResult<Json<Identity>> {
    let identity = state
        .auth
        .open_recovery_session(&request.access_token, &request.refresh_token)
        .await?;
    Ok(Json(identity))
}

pub async fn current_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let current = state.session.current();
    Json(SessionResponse {
        initialized: current.initialized,
        recovery: current.session.as_ref().map(|s| s.recovery).unwrap_or(false),
        identity: current.session.map(|s| s.identity),
    })
}
