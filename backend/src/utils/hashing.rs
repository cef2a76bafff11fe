//! One-way hashing for passwords and refresh-token secrets.
//!
//! Passwords use bcrypt. Refresh tokens use argon2 instead: bcrypt only reads
//! the first 72 bytes of its input, and signed tokens for the same identity
//! share a longer prefix than that.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::errors::{ServiceError, ServiceResult};

/// Hash a password before storing it in the database
pub fn hash_password(password: &str, cost: u32) -> ServiceResult<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
}

/// Verify a password against the stored hash.
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Hash a refresh token so only its digest is persisted
pub fn hash_refresh_secret(secret: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::internal_error(format!("Token hashing failed: {}", e)))
}

/// Check a presented refresh token against a stored digest
pub fn verify_refresh_secret(secret: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse", 4).unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_refresh_secret_hash_is_salted() {
        let first = hash_refresh_secret("token-value").unwrap();
        let second = hash_refresh_secret("token-value").unwrap();

        assert_ne!(first, second);
        assert!(verify_refresh_secret("token-value", &first));
        assert!(verify_refresh_secret("token-value", &second));
        assert!(!verify_refresh_secret("other-value", &first));
    }

    #[test]
    fn test_refresh_secret_distinguishes_long_shared_prefix() {
        let prefix = "p".repeat(200);
        let hash = hash_refresh_secret(&format!("{}one", prefix)).unwrap();
        assert!(!verify_refresh_secret(&format!("{}two", prefix), &hash));
    }

    #[test]
    fn test_malformed_refresh_hash_never_verifies() {
        assert!(!verify_refresh_secret("token-value", ""));
        assert!(!verify_refresh_secret("token-value", "$2b$04$garbage"));
    }
}
