use std::sync::Arc;

use axum::extract::FromRef;
use rand::rngs::OsRng;
use rand::RngCore;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::mailer::Mailer;
use crate::state::AppState;

use super::dto::{SignUpRequest, TokenResponse, UserResponse};
use super::error::AuthError;
use super::jwt::JwtKeys;
use super::password;
use super::store::{StoreError, UserStore};
use super::user::{NewUser, User};

/// Validity window for an emailed reset token.
const RESET_TOKEN_TTL: Duration = Duration::minutes(15);

/// Orchestrates the credential lifecycle against the store, the mailer and
/// the token issuer. All invariants live here; the HTTP handlers stay thin.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    keys: JwtKeys,
    origin: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        keys: JwtKeys,
        origin: String,
    ) -> Self {
        Self {
            store,
            mailer,
            keys,
            origin,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.mailer.clone(),
            JwtKeys::from_ref(state),
            state.config.origin.clone(),
        )
    }

    /// Creates an account with a fresh salt and hashed password. Input is
    /// already validated by the request type.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<User, AuthError> {
        let salt = password::generate_salt();
        let hash = password::hash_with_salt(&request.password, &salt)
            .map_err(AuthError::Internal)?;

        let user = self
            .store
            .create(NewUser {
                name: request.name,
                email: request.email,
                address: request.address,
                phone: request.phone,
                password: hash,
                salt,
            })
            .await
            .map_err(storage_error)?;

        info!(user_id = %user.id, email = %user.email, "user signed up");
        Ok(user)
    }

    /// Issues a bearer token on a correct password. Unknown email and wrong
    /// password fail identically.
    pub async fn sign_in(
        &self,
        email: &str,
        password_plain: &str,
    ) -> Result<TokenResponse, AuthError> {
        let Some(user) = self
            .store
            .find_by_email(email)
            .await
            .map_err(storage_error)?
        else {
            warn!(email = %email, "sign-in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let ok = password::verify_password(password_plain, &user.salt, &user.password)
            .map_err(AuthError::Internal)?;
        if !ok {
            warn!(user_id = %user.id, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let (access_token, expires_at) =
            self.keys.sign(&user.email).map_err(AuthError::Internal)?;
        info!(user_id = %user.id, "user signed in");
        Ok(TokenResponse {
            access_token,
            expires_at,
        })
    }

    /// Issues a single-use reset token, stores it, then emails the reset
    /// link. The token is persisted before the send so a transient mail
    /// failure does not strand the user without a valid token.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self
            .store
            .find_by_email(email)
            .await
            .map_err(storage_error)?
        else {
            // Same error kind and message as sign-in.
            warn!(email = %email, "password reset for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let token = generate_reset_token();
        let expires_at = OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
        self.store
            .save_reset_token(&user.email, &token, expires_at)
            .await
            .map_err(storage_error)?;

        let link = format!(
            "{}/reset-password/{}",
            self.origin.trim_end_matches('/'),
            token
        );
        self.mailer
            .send_password_reset(&user.name, &user.email, &link)
            .await
            .map_err(AuthError::Notification)?;

        info!(user_id = %user.id, "password reset email dispatched");
        Ok(())
    }

    /// Consumes a reset token and installs a new password under a fresh
    /// salt. Missing, already-used and expired tokens fail identically.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let Some(user) = self
            .store
            .find_by_reset_token(reset_token)
            .await
            .map_err(storage_error)?
        else {
            return Err(AuthError::InvalidOrExpiredToken);
        };

        // Strict comparison: a token is still usable at the exact expiry
        // instant.
        let expired = match user.reset_token_expiration {
            Some(expiration) => OffsetDateTime::now_utc() > expiration,
            None => true,
        };
        if expired {
            warn!(user_id = %user.id, "reset attempt with expired token");
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let salt = password::generate_salt();
        let hash =
            password::hash_with_salt(new_password, &salt).map_err(AuthError::Internal)?;
        self.store
            .update_credentials(user.id, &hash, &salt)
            .await
            .map_err(storage_error)?;

        info!(user_id = %user.id, "password reset completed");
        Ok(())
    }

    /// Pure projection of an authenticated user to its public shape.
    pub fn me(user: User) -> UserResponse {
        UserResponse::from(user)
    }
}

fn storage_error(e: StoreError) -> AuthError {
    match e {
        StoreError::Duplicate => AuthError::DuplicateAccount,
        StoreError::Other(source) => AuthError::Storage(source),
    }
}

/// Opaque high-entropy reset token, hex-encoded.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
