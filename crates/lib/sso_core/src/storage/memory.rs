//! In-memory stores.
//!
//! One lock guards every table so uniqueness checks and inserts are atomic,
//! mirroring the constraints of the SQL schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{AdminStore, AppStore, StorageError, UserStore};
use crate::models::auth::{Admin, App, Level, User};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    admins: HashMap<String, Admin>,
    apps: HashMap<i64, (App, String)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// All three stores held in process memory.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(email) {
            return Err(StorageError::UserExists);
        }
        let id = tables.next_id();
        let now = Utc::now();
        tables.users.insert(
            email.to_string(),
            User {
                id,
                email: email.to_string(),
                pass_hash: pass_hash.to_string(),
                created_at: now,
                visited_at: now,
            },
        );
        Ok(id)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError> {
        self.tables
            .read()
            .await
            .users
            .get(email)
            .cloned()
            .ok_or(StorageError::UserNotFound)
    }

    async fn update_last_visit(&self, email: &str, at: DateTime<Utc>) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(email)
            .ok_or(StorageError::UserNotFound)?;
        user.visited_at = at;
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStorage {
    async fn find_admin_by_email(&self, email: &str) -> Result<Admin, StorageError> {
        self.tables
            .read()
            .await
            .admins
            .get(email)
            .cloned()
            .ok_or(StorageError::AdminNotFound)
    }

    async fn add_admin(&self, email: &str, level: Level) -> Result<i64, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(email) {
            return Err(StorageError::UserNotFound);
        }
        if tables.admins.contains_key(email) {
            return Err(StorageError::AdminExists);
        }
        let id = tables.next_id();
        tables.admins.insert(
            email.to_string(),
            Admin {
                id,
                email: email.to_string(),
                level,
            },
        );
        Ok(id)
    }

    async fn remove_admin(&self, email: &str) -> Result<(), StorageError> {
        self.tables
            .write()
            .await
            .admins
            .remove(email)
            .map(|_| ())
            .ok_or(StorageError::AdminNotFound)
    }
}

#[async_trait]
impl AppStore for MemoryStorage {
    async fn save_app(
        &self,
        name: &str,
        key_digest: &str,
        secret: &str,
    ) -> Result<i64, StorageError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .apps
            .values()
            .any(|(app, digest)| app.name == name || digest == key_digest);
        if taken {
            return Err(StorageError::AppExists);
        }
        let id = tables.next_id();
        let app = App {
            id,
            name: name.to_string(),
            secret: secret.to_string(),
        };
        tables.apps.insert(id, (app, key_digest.to_string()));
        Ok(id)
    }

    async fn find_app_by_id(&self, id: i64) -> Result<App, StorageError> {
        self.tables
            .read()
            .await
            .apps
            .get(&id)
            .map(|(app, _)| app.clone())
            .ok_or(StorageError::AppNotFound)
    }

    async fn find_app_by_key(&self, key_digest: &str) -> Result<App, StorageError> {
        self.tables
            .read()
            .await
            .apps
            .values()
            .find(|(_, digest)| digest == key_digest)
            .map(|(app, _)| app.clone())
            .ok_or(StorageError::AppNotFound)
    }
}
