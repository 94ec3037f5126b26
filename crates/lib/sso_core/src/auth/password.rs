//! Password hashing via bcrypt.
//!
//! bcrypt is deliberately slow, so the async variants run it on the blocking
//! pool instead of the request task.

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_COST: u32 = 10;

/// Hash a password with bcrypt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
}
