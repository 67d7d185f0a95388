use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};
use tracing::debug;

use crate::config::JwtConfig;
use crate::state::AppState;

/// JWT payload; `sub` carries the account email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Signs a bearer token for `email`, valid until the same calendar day
    /// one year from now. Returns the token together with that expiry.
    pub fn sign(&self, email: &str) -> anyhow::Result<(String, OffsetDateTime)> {
        let now = OffsetDateTime::now_utc();
        let expires_at = one_year_after(now);
        let claims = Claims {
            sub: email.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(email = %email, "jwt signed");
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

/// Same calendar day next year. 29 February rolls forward to 1 March when
/// the target year has no leap day; time of day is preserved.
pub(crate) fn one_year_after(moment: OffsetDateTime) -> OffsetDateTime {
    let date = moment.date();
    let bumped = date.replace_year(date.year() + 1).unwrap_or_else(|_| {
        Date::from_calendar_date(date.year() + 1, Month::March, 1)
            .expect("1 March is a valid date in every year")
    });
    bumped.with_time(moment.time()).assume_offset(moment.offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn make_keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let (token, expires_at) = keys.sign("a@x.com").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp as i64, expires_at.unix_timestamp());
    }

    #[test]
    fn signed_expiry_follows_the_calendar_rule() {
        let keys = make_keys();
        let before = OffsetDateTime::now_utc();
        let (_, expires_at) = keys.sign("a@x.com").expect("sign");
        let after = OffsetDateTime::now_utc();
        assert!(expires_at >= one_year_after(before));
        assert!(expires_at <= one_year_after(after));
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let (mut token, _) = keys.sign("a@x.com").expect("sign");
        token.push('x');
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys();
        let bad = JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "other-issuer".into(),
            audience: "other-aud".into(),
        });
        let (token, _) = good.sign("a@x.com").expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys();
        let bad = JwtKeys::new(&JwtConfig {
            secret: "another-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
        });
        let (token, _) = good.sign("a@x.com").expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn one_year_after_keeps_month_and_day() {
        let expiry = one_year_after(datetime!(2025-08-07 10:30:00 UTC));
        assert_eq!(expiry, datetime!(2026-08-07 10:30:00 UTC));
    }

    #[test]
    fn one_year_after_rolls_leap_day_forward() {
        let expiry = one_year_after(datetime!(2024-02-29 23:59:00 UTC));
        assert_eq!(expiry, datetime!(2025-03-01 23:59:00 UTC));
    }

    #[test]
    fn one_year_after_handles_leap_day_into_leap_year_gap() {
        // 2028 is a leap year but 2028-02-29 -> 2029 is not.
        let expiry = one_year_after(datetime!(2028-02-29 00:00:00 UTC));
        assert_eq!(expiry, datetime!(2029-03-01 00:00:00 UTC));
    }
}
