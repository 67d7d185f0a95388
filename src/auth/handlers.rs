use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::state::AppState;

use super::dto::{
    ForgotPasswordRequest, ResetPasswordRequest, SignInRequest, SignUpRequest, TokenResponse,
    UserResponse,
};
use super::error::AuthError;
use super::extractors::AuthUser;
use super::service::AuthService;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/forgot-password", put(forgot_password))
        .route("/auth/reset-password", put(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(mut payload): Json<SignUpRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    payload.normalize_and_validate()?;
    let service = AuthService::from_state(&state);

    let email = payload.email.clone();
    let password = payload.password.clone();
    service.sign_up(payload).await?;

    // The fresh account is signed in right away so the client leaves this
    // request with a usable token.
    let token = service.sign_in(&email, &password).await?;
    Ok(Json(token))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(mut payload): Json<SignInRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    payload.normalize_and_validate()?;
    let token = AuthService::from_state(&state)
        .sign_in(&payload.email, &payload.password)
        .await?;
    Ok(Json(token))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    payload.normalize_and_validate()?;
    AuthService::from_state(&state)
        .forgot_password(&payload.email)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    payload.validate()?;
    AuthService::from_state(&state)
        .reset_password(&payload.reset_token, &payload.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(user))]
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(AuthService::me(user))
}
