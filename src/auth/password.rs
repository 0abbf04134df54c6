use crate::error::ApiError;
use bcrypt::{hash, verify, DEFAULT_COST};

/// One-way hash of a plaintext password.
///
/// Called exactly where a password value enters the system (registration and
/// a password-bearing profile update), so an already-stored hash is never
/// rehashed.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ApiError::InternalServerError(format!("failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, ApiError> {
    verify(password, hashed_password)
        .map_err(|e| ApiError::InternalServerError(format!("failed to verify password: {}", e)))
}
