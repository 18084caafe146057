//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings; the salt is generated here and embedded in
//! the returned string, so callers never handle it.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::LogbookError;

pub fn hash(password: &str) -> Result<String, LogbookError> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hashed.to_string())
}

/// A stored value that does not parse as a PHC string never verifies.
pub fn verify(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
