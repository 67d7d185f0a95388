use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Public origin used to build password-reset links.
    pub origin: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let origin =
            std::env::var("SERVER_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gatekeeper".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "gatekeeper-users".into()),
        };
        let mail = MailConfig {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into()),
            smtp_username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_address: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Gatekeeper <no-reply@localhost>".into()),
        };
        Ok(Self {
            database_url,
            origin,
            jwt,
            mail,
        })
    }
}
