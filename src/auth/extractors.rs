use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::state::AppState;

use super::error::AuthError;
use super::jwt::JwtKeys;
use super::user::User;

/// Resolves the `Authorization: Bearer` header on a request to the full
/// user record. The single place a request goes from anonymous to
/// authenticated; protected handlers just take this as a parameter.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AuthError::Unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AuthError::Unauthorized
        })?;

        let user = state
            .store
            .find_by_email(&claims.sub)
            .await
            .map_err(|e| {
                warn!(error = %e, "user lookup during authentication failed");
                AuthError::Unauthorized
            })?
            .ok_or(AuthError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::auth::store::UserStore;
    use crate::auth::user::NewUser;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/auth/me");
        if let Some(value) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).expect("request builds").into_parts();
        parts
    }

    async fn seed_user(state: &AppState, email: &str) {
        state
            .store
            .create(NewUser {
                name: "A".into(),
                email: email.into(),
                address: None,
                phone: None,
                password: "hash".into(),
                salt: "salt".into(),
            })
            .await
            .expect("seed user");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Basic abc"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Bearer not-a-jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn valid_token_for_a_missing_user_is_unauthorized() {
        let state = AppState::fake();
        let (token, _) = JwtKeys::from_ref(&state)
            .sign("ghost@x.com")
            .expect("sign");
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn valid_token_resolves_to_the_user() {
        let state = AppState::fake();
        seed_user(&state, "a@x.com").await;
        let (token, _) = JwtKeys::from_ref(&state).sign("a@x.com").expect("sign");

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let AuthUser(user) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("authenticates");
        assert_eq!(user.email, "a@x.com");
    }
}
