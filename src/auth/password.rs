use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use tracing::warn;

use crate::error::AgencyError;

/// Argon2id PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, AgencyError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AgencyError::PasswordHash(e.to_string()))
}

/// False on mismatch and on an unparseable stored hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash checked when a username is unknown, so a miss costs the same as a
/// wrong password.
pub fn decoy_hash() -> Result<String, AgencyError> {
    let secret = SaltString::generate(&mut OsRng);
    hash_password(secret.as_str())
}

pub async fn hash_password_blocking(password: String) -> Result<String, AgencyError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: String, stored: String) -> Result<bool, AgencyError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?)
}
