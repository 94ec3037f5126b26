//! Granting and revoking admin privileges.

use std::sync::Arc;

use tracing::{error, info};

use crate::auth::AuthError;
use crate::models::auth::Level;
use crate::storage::{AdminStore, StorageError};

pub struct PermissionService {
    admins: Arc<dyn AdminStore>,
}

impl PermissionService {
    pub fn new(admins: Arc<dyn AdminStore>) -> Self {
        Self { admins }
    }

    /// Grant admin level to an existing user. Returns the admin row ID.
    pub async fn add_admin(&self, email: &str) -> Result<i64, AuthError> {
        const OP: &str = "services.permission.add_admin";

        match self.admins.add_admin(email, Level::ADMIN).await {
            Ok(id) => {
                info!(op = OP, admin_id = id, "admin added");
                Ok(id)
            }
            Err(StorageError::AdminExists) => {
                info!(op = OP, "admin already exists");
                Err(AuthError::AdminAlreadyExists)
            }
            Err(StorageError::UserNotFound) => {
                info!(op = OP, "user not found");
                Err(AuthError::UserNotFound)
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to add admin");
                Err(e.into())
            }
        }
    }

    pub async fn delete_admin(&self, email: &str) -> Result<(), AuthError> {
        const OP: &str = "services.permission.delete_admin";

        match self.admins.remove_admin(email).await {
            Ok(()) => {
                info!(op = OP, "admin deleted");
                Ok(())
            }
            Err(StorageError::AdminNotFound) => {
                info!(op = OP, "admin not found");
                Err(AuthError::AdminNotFound)
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to delete admin");
                Err(e.into())
            }
        }
    }
}
