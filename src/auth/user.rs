use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password: String, // argon2 PHC string, not exposed in JSON
    #[serde(skip_serializing)]
    pub salt: String,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiration: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Field set for inserting a new user. `password` is already hashed with
/// `salt` by the time this struct exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    pub salt: String,
}
