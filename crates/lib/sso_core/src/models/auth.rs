//! Authentication domain models.
//!
//! These are internal domain models, distinct from the wire types exposed by
//! `sso_api` (which rename fields to camelCase and never carry secrets).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privilege level carried by a principal.
///
/// A small ordinal: higher values unlock more gated operations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Level(pub u8);

impl Level {
    /// Plain user without an admin grant.
    pub const USER: Level = Level(0);
    /// Administrator; the minimum for every gated method.
    pub const ADMIN: Level = Level(2);
    /// Registered application presenting its API key.
    pub const APPLICATION: Level = Level(3);
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// End-user account, including the password hash.
#[derive(Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub pass_hash: String,
    pub created_at: DateTime<Utc>,
    pub visited_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("pass_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("visited_at", &self.visited_at)
            .finish()
    }
}

/// Outward view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub visited_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            visited_at: user.visited_at,
        }
    }
}

/// Registered client application (tenant).
///
/// `secret` signs every user token issued on behalf of this application.
#[derive(Clone)]
pub struct App {
    pub id: i64,
    pub name: String,
    pub secret: String,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Privilege grant on a user, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    pub level: Level,
}

/// JWT claims embedded in user tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID.
    pub uid: i64,
    /// User email.
    pub email: String,
    /// Privilege level resolved at login.
    pub level: Level,
    /// Issuing application ID.
    pub app_id: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(Level::USER < Level::ADMIN);
        assert!(Level::ADMIN < Level::APPLICATION);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let app = App {
            id: 1,
            name: "billing".into(),
            secret: "s3cr3t".into(),
        };
        let rendered = format!("{app:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("billing"));
    }

    #[test]
    fn profile_drops_password_hash() {
        let now = Utc::now();
        let user = User {
            id: 7,
            email: "a@x.com".into(),
            pass_hash: "$2b$04$hash".into(),
            created_at: now,
            visited_at: now,
        };
        let profile = UserProfile::from(user);
        assert_eq!(profile.id, 7);
        assert!(!format!("{profile:?}").contains("$2b$"));
    }
}
