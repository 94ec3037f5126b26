//! Application API keys and signing secrets.
//!
//! Keys are drawn from the OS random source; a failing source is reported as
//! `AuthError::Entropy` and never replaced by a weaker generator.

use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use super::AuthError;

/// API key size: 128 bits.
pub const API_KEY_BYTES: usize = 16;

/// Per-application token signing secret size: 256 bits.
pub const SIGNING_SECRET_BYTES: usize = 32;

/// Generate a new application API key (32 lowercase hex chars).
pub fn generate_api_key() -> Result<String, AuthError> {
    generate_secret(API_KEY_BYTES)
}

/// Generate a new per-application signing secret (64 lowercase hex chars).
pub fn generate_signing_secret() -> Result<String, AuthError> {
    generate_secret(SIGNING_SECRET_BYTES)
}

/// Fill `len` bytes from the OS random source and hex-encode them.
pub fn generate_secret(len: usize) -> Result<String, AuthError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(hex::encode(&bytes))
}

/// SHA-256 digest of an API key, as stored and looked up by the app store.
pub fn digest_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
