//! Persistence collaborators.
//!
//! The services only see these narrow traits. Uniqueness of user emails,
//! application names and API keys is enforced atomically by the store; a
//! losing concurrent writer gets the matching `*Exists` sentinel.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::auth::{Admin, App, Level, User};

/// Storage sentinel errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("admin already exists")]
    AdminExists,

    #[error("admin not found")]
    AdminNotFound,

    #[error("app already exists")]
    AppExists,

    #[error("app not found")]
    AppNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user, returning its ID. Fails with `UserExists`.
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, StorageError>;

    /// Fails with `UserNotFound`.
    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError>;

    /// Record the last successful login.
    async fn update_last_visit(&self, email: &str, at: DateTime<Utc>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Fails with `AdminNotFound`.
    async fn find_admin_by_email(&self, email: &str) -> Result<Admin, StorageError>;

    /// Grant `level` to an existing user. Fails with `AdminExists` or `UserNotFound`.
    async fn add_admin(&self, email: &str, level: Level) -> Result<i64, StorageError>;

    /// Fails with `AdminNotFound`.
    async fn remove_admin(&self, email: &str) -> Result<(), StorageError>;
}

#[async_trait]
pub trait AppStore: Send + Sync {
    /// Persist a new application. `key_digest` is the SHA-256 of its API key.
    /// Fails with `AppExists` when the name or key digest is taken.
    async fn save_app(&self, name: &str, key_digest: &str, secret: &str)
    -> Result<i64, StorageError>;

    /// Fails with `AppNotFound`.
    async fn find_app_by_id(&self, id: i64) -> Result<App, StorageError>;

    /// Look up an application by API key digest. Fails with `AppNotFound`.
    async fn find_app_by_key(&self, key_digest: &str) -> Result<App, StorageError>;
}
