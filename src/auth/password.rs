//! Password hashing and complexity rules.
//!
//! Hashes are Argon2id PHC strings; the salt comes from the thread RNG.
//! Complexity failures are reported with identity-style codes so the client
//! can show every broken rule at once.

use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use thiserror::Error;

use crate::config::PasswordPolicy;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// A broken password rule or account constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityError {
    pub code: &'static str,
    pub description: String,
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Run a full verification against a throwaway hash so an unknown account
/// costs as much as a wrong password. Always `false`.
pub fn verify_unknown_account(password: &str) -> bool {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let dummy = DUMMY_HASH.get_or_init(|| hash_password("unknown-account-placeholder").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
    false
}

/// Every rule of `policy` that `password` breaks, in a fixed order.
pub fn check_policy(policy: &PasswordPolicy, password: &str) -> Vec<IdentityError> {
    let mut errors = Vec::new();

    if password.chars().count() < policy.min_length {
        errors.push(IdentityError {
            code: "PasswordTooShort",
            description: format!("Passwords must be at least {} characters.", policy.min_length),
        });
    }
    if policy.require_non_alphanumeric && password.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(IdentityError {
            code: "PasswordRequiresNonAlphanumeric",
            description: "Passwords must have at least one non alphanumeric character.".to_string(),
        });
    }
    if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(IdentityError {
            code: "PasswordRequiresDigit",
            description: "Passwords must have at least one digit ('0'-'9').".to_string(),
        });
    }
    if policy.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(IdentityError {
            code: "PasswordRequiresLower",
            description: "Passwords must have at least one lowercase ('a'-'z').".to_string(),
        });
    }
    if policy.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(IdentityError {
            code: "PasswordRequiresUpper",
            description: "Passwords must have at least one uppercase ('A'-'Z').".to_string(),
        });
    }

    errors
}
