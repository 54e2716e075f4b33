use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use thiserror::Error;

/// Failure modes for password hashing and verification
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash was malformed: {0}")]
    MalformedHash(String),

    #[error("failed to verify password: {0}")]
    Verify(String),
}

/// Hashes a plaintext password with Argon2id and a per-password random salt,
/// producing a PHC format hash string suitable for storage
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|hash_err| PasswordError::Hash(hash_err.to_string()))?;

    Ok(password_hash.to_string())
}

/// Checks a plaintext password against a stored PHC hash string. A mismatched
/// password is an Ok(false), not an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|parse_err| PasswordError::MalformedHash(parse_err.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(other_err) => Err(PasswordError::Verify(other_err.to_string())),
    }
}
