//! Password hashing.
//!
//! Passwords are stored as Argon2id PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so parameters travel with
//! each hash and can be raised without invalidating existing accounts.

use crate::{Error, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hashes a password with a fresh random salt.
///
/// # Errors
///
/// Returns an error if the hasher rejects the input.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::operation("hash_password", e))
}

/// Verifies a password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns an error if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| Error::operation("parse_password_hash", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::operation("verify_password", e)),
    }
}
