use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Fresh random salt in the PHC base64 alphabet. Generated at account
/// creation and again at every password change.
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Hashes `plain` with the given salt. Deterministic for a fixed
/// (plain, salt) pair, which is what lets verification recompute and compare.
pub fn hash_with_salt(plain: &str, salt: &str) -> anyhow::Result<String> {
    let salt = SaltString::from_b64(salt).map_err(|e| {
        error!(error = %e, "malformed salt");
        anyhow::anyhow!(e.to_string())
    })?;
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Recomputes the hash of `plain` under `salt` and compares it to the
/// stored hash.
pub fn verify_password(plain: &str, salt: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let recomputed = hash_with_salt(plain, salt)?;
    Ok(recomputed == stored_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_never_equals_plaintext() {
        let salt = generate_salt();
        let hash = hash_with_salt("secret1", &salt).expect("hashing should succeed");
        assert_ne!(hash, "secret1");
    }

    #[test]
    fn hash_is_deterministic_for_a_fixed_salt() {
        let salt = generate_salt();
        let first = hash_with_salt("secret1", &salt).expect("hashing should succeed");
        let second = hash_with_salt("secret1", &salt).expect("hashing should succeed");
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_salts_give_distinct_hashes() {
        let first = hash_with_salt("secret1", &generate_salt()).expect("hash");
        let second = hash_with_salt("secret1", &generate_salt()).expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn verify_accepts_correct_password() {
        let salt = generate_salt();
        let hash = hash_with_salt("correct-horse-battery-staple", &salt).expect("hash");
        assert!(
            verify_password("correct-horse-battery-staple", &salt, &hash).expect("verify")
        );
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let salt = generate_salt();
        let hash = hash_with_salt("secret1", &salt).expect("hash");
        assert!(!verify_password("wrong", &salt, &hash).expect("verify"));
    }

    #[test]
    fn malformed_salt_errors() {
        let err = hash_with_salt("anything", "not a salt!").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
