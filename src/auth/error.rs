use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Failure kinds surfaced by the auth operations. Credential failures carry
/// fixed, non-specific messages; infrastructure detail goes to the logs and
/// never into a response body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    /// Unknown email or wrong password; the two are indistinguishable on
    /// purpose.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Email already in use")]
    DuplicateAccount,
    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,
    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
    #[error("notification failure")]
    Notification(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            AuthError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
            }
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            AuthError::DuplicateAccount => (StatusCode::CONFLICT, "Email already in use".into()),
            AuthError::InvalidOrExpiredToken => {
                (StatusCode::CONFLICT, "Invalid or expired reset token".into())
            }
            AuthError::Storage(source) => {
                error!(error = %source, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
            AuthError::Notification(source) => {
                error!(error = %source, "notification failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
            AuthError::Internal(source) => {
                error!(error = %source, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_error_kind() {
        let cases = [
            (
                AuthError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::DuplicateAccount, StatusCode::CONFLICT),
            (AuthError::InvalidOrExpiredToken, StatusCode::CONFLICT),
            (
                AuthError::Storage(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Notification(anyhow::anyhow!("smtp down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn infrastructure_detail_stays_out_of_the_message() {
        let err = AuthError::Storage(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.to_string(), "storage failure");
    }
}
