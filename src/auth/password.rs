//! Passwords for local accounts
//!
//! `[[auth.users]]` entries carry an Argon2id PHC string in `password_hash`.
//! The `hash-password` subcommand prints one with `hash_password`; the local
//! identity provider checks sign-ins against it with `verify_password`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{ArchiveError, Result};

/// PHC string for a `password_hash` config entry
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ArchiveError::Config(format!("failed to hash password: {e}")))
}

/// Check a sign-in password against an account's configured hash
///
/// `Ok(false)` is a wrong password. A hash that does not parse means the
/// config file is broken and comes back as `Config`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ArchiveError::Config(format!("invalid password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
