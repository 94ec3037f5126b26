//! SQLite-backed stores.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::{AdminStore, AppStore, StorageError, UserStore};
use crate::models::auth::{Admin, App, Level, User};

/// Maximum number of pooled SQLite connections.
const MAX_CONNECTIONS: u32 = 5;

/// All three stores over one SQLite database.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if missing) the database at `path`.
    pub async fn connect(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn level_from_row(raw: i64) -> Result<Level, StorageError> {
    u8::try_from(raw)
        .map(Level)
        .map_err(|_| StorageError::Corrupt(format!("admin level {raw} out of range")))
}

type UserRow = (i64, String, String, DateTime<Utc>, DateTime<Utc>);

fn user_from_row((id, email, pass_hash, created_at, visited_at): UserRow) -> User {
    User {
        id,
        email,
        pass_hash,
        created_at,
        visited_at,
    }
}

#[async_trait]
impl UserStore for SqliteStorage {
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, StorageError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (email, pass_hash, created_at, visited_at) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(pass_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::UserExists
            } else {
                StorageError::Database(e)
            }
        })?;
        Ok(result.last_insert_rowid())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, pass_hash, created_at, visited_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row).ok_or(StorageError::UserNotFound)
    }

    async fn update_last_visit(&self, email: &str, at: DateTime<Utc>) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET visited_at = ? WHERE email = ?")
            .bind(at)
            .bind(email)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::UserNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AdminStore for SqliteStorage {
    async fn find_admin_by_email(&self, email: &str) -> Result<Admin, StorageError> {
        let row = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT id, email, level FROM admins WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        let (id, email, level) = row.ok_or(StorageError::AdminNotFound)?;
        Ok(Admin {
            id,
            email,
            level: level_from_row(level)?,
        })
    }

    async fn add_admin(&self, email: &str, level: Level) -> Result<i64, StorageError> {
        let result = sqlx::query("INSERT INTO admins (email, level) VALUES (?, ?)")
            .bind(email)
            .bind(i64::from(level.0))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::AdminExists
                } else if is_foreign_key_violation(&e) {
                    StorageError::UserNotFound
                } else {
                    StorageError::Database(e)
                }
            })?;
        Ok(result.last_insert_rowid())
    }

    async fn remove_admin(&self, email: &str) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM admins WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::AdminNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AppStore for SqliteStorage {
    async fn save_app(
        &self,
        name: &str,
        key_digest: &str,
        secret: &str,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query("INSERT INTO apps (name, key_hash, secret) VALUES (?, ?, ?)")
            .bind(name)
            .bind(key_digest)
            .bind(secret)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::AppExists
                } else {
                    StorageError::Database(e)
                }
            })?;
        Ok(result.last_insert_rowid())
    }

    async fn find_app_by_id(&self, id: i64) -> Result<App, StorageError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, name, secret FROM apps WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(id, name, secret)| App { id, name, secret })
            .ok_or(StorageError::AppNotFound)
    }

    async fn find_app_by_key(&self, key_digest: &str) -> Result<App, StorageError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, name, secret FROM apps WHERE key_hash = ?",
        )
        .bind(key_digest)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(id, name, secret)| App { id, name, secret })
            .ok_or(StorageError::AppNotFound)
    }
}
