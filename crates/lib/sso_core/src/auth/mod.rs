//! Authentication and authorization logic.
//!
//! Provides secret generation, password hashing, the token codec, bearer
//! credential parsing and the credential verifier shared by `sso_api`.

pub mod credential;
pub mod password;
pub mod secret;
pub mod token;
pub mod verifier;

use thiserror::Error;

use crate::storage::StorageError;
use token::TokenError;

/// Authentication domain errors.
///
/// Storage sentinels are translated into the domain variants by the services;
/// `Storage` only carries failures unrelated to caller input.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("App already exists")]
    AppAlreadyExists,

    #[error("Admin already exists")]
    AdminAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}
