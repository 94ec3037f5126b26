//! Bearer credential parsing.
//!
//! The `authorization` value names its kind explicitly:
//! `Bearer <token>` for a user token, `ApiKey <key>` for an application key.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Scheme for signed user tokens.
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme for raw application API keys.
pub const API_KEY_SCHEME: &str = "ApiKey";

/// A credential presented by the caller, tagged with its kind.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    App(String),
    User(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::App(_) => f.write_str("Credential::App(<redacted>)"),
            Credential::User(_) => f.write_str("Credential::User(<redacted>)"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("unsupported authorization scheme")]
    UnsupportedScheme,

    #[error("empty credential")]
    Empty,
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (scheme, value) = raw.split_once(' ').unwrap_or((raw, ""));
        let value = value.trim();

        let is_user = scheme.eq_ignore_ascii_case(BEARER_SCHEME);
        if !is_user && !scheme.eq_ignore_ascii_case(API_KEY_SCHEME) {
            return Err(CredentialError::UnsupportedScheme);
        }
        if value.is_empty() {
            return Err(CredentialError::Empty);
        }

        Ok(if is_user {
            Credential::User(value.to_string())
        } else {
            Credential::App(value.to_string())
        })
    }
}
