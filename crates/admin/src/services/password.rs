//! Shared admin password checks.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::AdminPassword;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed")]
    Hash,
}

/// Hash a password using Argon2id, for `ADMIN_PASSWORD_HASH`.
///
/// # Errors
///
/// Returns `PasswordError::Hash` if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Check a login attempt against the configured password.
#[must_use]
pub fn verify_password(configured: &AdminPassword, candidate: &str) -> bool {
    match configured {
        AdminPassword::Hash(hash) => {
            let Ok(parsed_hash) = PasswordHash::new(hash.expose_secret()) else {
                return false;
            };
            Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed_hash)
                .is_ok()
        }
        AdminPassword::Plain(expected) => {
            // Digests first so the comparison length never depends on input.
            let expected = Sha256::digest(expected.expose_secret().as_bytes());
            let candidate = Sha256::digest(candidate.as_bytes());
            expected
                .iter()
                .zip(candidate.iter())
                .fold(0u8, |acc, (x, y)| acc | (x ^ y))
                == 0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("kX9#mP2$vL7@nQ4!").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let configured = AdminPassword::Hash(SecretString::from(hash));
        assert!(verify_password(&configured, "kX9#mP2$vL7@nQ4!"));
        assert!(!verify_password(&configured, "kX9#mP2$vL7@nQ4?"));
        assert!(!verify_password(&configured, ""));
    }

    #[test]
    fn test_plain_password() {
        let configured = AdminPassword::Plain(SecretString::from("kX9#mP2$vL7@nQ4!"));
        assert!(verify_password(&configured, "kX9#mP2$vL7@nQ4!"));
        assert!(!verify_password(&configured, "kX9#mP2$vL7@nQ4"));
    }

    #[test]
    fn test_unparseable_hash_never_matches() {
        let configured = AdminPassword::Hash(SecretString::from("garbage"));
        assert!(!verify_password(&configured, "garbage"));
    }
}
