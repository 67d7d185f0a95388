use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::AuthError;
use super::user::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &mut String) {
    *email = email.trim().to_lowercase();
}

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub password: String,
}

impl SignUpRequest {
    pub fn normalize_and_validate(&mut self) -> Result<(), AuthError> {
        normalize_email(&mut self.email);
        if self.name.trim().is_empty() {
            return Err(AuthError::Validation("Name must not be empty".into()));
        }
        if !is_valid_email(&self.email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        if self.password.len() < 6 {
            return Err(AuthError::Validation("Password too short".into()));
        }
        Ok(())
    }
}

/// Request body for sign-in.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl SignInRequest {
    pub fn normalize_and_validate(&mut self) -> Result<(), AuthError> {
        normalize_email(&mut self.email);
        if !is_valid_email(&self.email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn normalize_and_validate(&mut self) -> Result<(), AuthError> {
        normalize_email(&mut self.email);
        if !is_valid_email(&self.email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.reset_token.is_empty() {
            return Err(AuthError::Validation("Reset token must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("Password must not be empty".into()));
        }
        Ok(())
    }
}

/// Response returned after sign-up and sign-in.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Public projection of a user. Credential fields are absent from the type,
/// not merely skipped at serialization time.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            address: user.address,
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}
