//! Password hashing and verification.
//!
//! Passwords are hashed with Argon2id before they ever reach the credential
//! store; the token subsystem never sees or embeds a plaintext password or
//! its hash.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts come from OsRng (cryptographically secure RNG)
//! - Hashes are stored in PHC string format
//!
//! Hashing runs once per signup/login and is never cached or parallelized
//! away.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, AuthResult};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password for storage using Argon2id.
///
/// # Errors
///
/// Returns [`AuthError::PasswordHash`] if hashing fails, which indicates a
/// misconfiguration rather than a user error.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::password_hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `Ok(true)` on a match and `Ok(false)` on a mismatch.
///
/// # Errors
///
/// Returns [`AuthError::PasswordHash`] only if the stored hash itself cannot
/// be parsed.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::password_hash(e.to_string()))?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Check a candidate password against the minimum-length policy.
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the password is too short.
pub fn check_password_policy(password: &str) -> AuthResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
