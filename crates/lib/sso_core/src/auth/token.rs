//! User token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with the issuing application's secret. The
//! header `kid` names that application so a verifier can pick the secret;
//! nothing in the payload is trusted until the signature has been checked.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use thiserror::Error;

use crate::models::auth::{App, Level, TokenClaims, User};

/// Signing algorithm for every user token.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Token codec failures.
///
/// Signature and expiry failures are distinct so callers can tell a forged
/// token from a stale one; the transport reports both as unauthenticated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("token encode: {0}")]
    Encode(String),
}

/// Issue a token for `user` on behalf of `app`, valid for `ttl` from now.
pub fn issue(user: &User, app: &App, level: Level, ttl: Duration) -> Result<String, TokenError> {
    issue_at(user, app, level, ttl, Utc::now().timestamp())
}

/// Issue a token as if the current unix time were `now`.
pub fn issue_at(
    user: &User,
    app: &App,
    level: Level,
    ttl: Duration,
    now: i64,
) -> Result<String, TokenError> {
    let exp = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or_else(|| TokenError::Encode("ttl out of range".into()))?;

    let claims = TokenClaims {
        uid: user.id,
        email: user.email.clone(),
        level,
        app_id: app.id,
        exp,
        iat: now,
    };
    let header = Header {
        kid: Some(app.id.to_string()),
        ..Header::new(ALGORITHM)
    };

    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(app.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encode(e.to_string()))
}

/// Verify `raw` with `secret` and return its claims.
pub fn parse(raw: &str, secret: &[u8]) -> Result<TokenClaims, TokenError> {
    parse_at(raw, secret, Utc::now().timestamp())
}

/// Verify `raw` with `secret` as if the current unix time were `now`.
///
/// A token is valid strictly before its `exp` instant.
pub fn parse_at(raw: &str, secret: &[u8], now: i64) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(ALGORITHM);
    // Expiry is checked below against `now` with no leeway.
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let claims = decode::<TokenClaims>(raw, &DecodingKey::from_secret(secret), &validation)
        .map_err(classify)?
        .claims;

    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

/// Read the issuing application ID from the token header.
///
/// The value is only a key selector: it must be confirmed against the
/// verified `app_id` claim before being trusted.
pub fn key_id(raw: &str) -> Result<i64, TokenError> {
    let header = decode_header(raw).map_err(classify)?;
    header
        .kid
        .as_deref()
        .and_then(|kid| kid.parse().ok())
        .ok_or_else(|| TokenError::Malformed("missing or invalid kid".into()))
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(err.to_string()),
    }
}
