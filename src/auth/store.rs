use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::user::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation; one account per email.
    #[error("duplicate record")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence contract for the user entity. The service layer only ever
/// talks to this trait, which is what keeps the auth logic testable against
/// an in-memory store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Stores a fresh reset token on the user, replacing any outstanding one.
    /// Token and expiration are always written together.
    async fn save_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// Writes a new password hash and salt and clears the reset token in the
    /// same statement.
    async fn update_credentials(
        &self,
        id: Uuid,
        password: &str,
        salt: &str,
    ) -> Result<(), StoreError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Duplicate;
        }
    }
    StoreError::Other(e.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, address, phone, password, salt)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, address, phone, password, salt,
                      reset_token, reset_token_expiration, created_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.address)
        .bind(&new_user.phone)
        .bind(&new_user.password)
        .bind(&new_user.salt)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, address, phone, password, salt,
                   reset_token, reset_token_expiration, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, address, phone, password, salt,
                   reset_token, reset_token_expiration, created_at
            FROM users
            WHERE reset_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn save_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expiration = $3
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Other(anyhow::anyhow!(
                "no user with email {email}"
            )));
        }
        Ok(())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        password: &str,
        salt: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password = $2, salt = $3,
                reset_token = NULL, reset_token_expiration = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password)
        .bind(salt)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Other(anyhow::anyhow!("no user with id {id}")));
        }
        Ok(())
    }
}

/// In-memory store backing `AppState::fake()` and the service tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: std::sync::Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self
            .users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            address: new_user.address,
            phone: new_user.phone,
            password: new_user.password,
            salt: new_user.salt,
            reset_token: None,
            reset_token_expiration: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(users
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn save_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut users = self
            .users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| anyhow::anyhow!("no user with email {email}"))?;
        user.reset_token = Some(token.to_owned());
        user.reset_token_expiration = Some(expires_at);
        Ok(())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        password: &str,
        salt: &str,
    ) -> Result<(), StoreError> {
        let mut users = self
            .users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("no user with id {id}"))?;
        user.password = password.to_owned();
        user.salt = salt.to_owned();
        user.reset_token = None;
        user.reset_token_expiration = None;
        Ok(())
    }
}
