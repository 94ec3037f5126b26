//! User profile and admin grant lookups.

use std::sync::Arc;

use tracing::{error, info};

use crate::auth::AuthError;
use crate::models::auth::{Admin, UserProfile};
use crate::storage::{AdminStore, StorageError, UserStore};

/// Read-only lookups of users and admin grants.
pub struct UserInfoService {
    users: Arc<dyn UserStore>,
    admins: Arc<dyn AdminStore>,
}

impl UserInfoService {
    pub fn new(users: Arc<dyn UserStore>, admins: Arc<dyn AdminStore>) -> Self {
        Self { users, admins }
    }

    /// Public profile of the user registered under `email`.
    pub async fn user(&self, email: &str) -> Result<UserProfile, AuthError> {
        const OP: &str = "services.user_info.user";

        match self.users.find_user_by_email(email).await {
            Ok(user) => Ok(user.into()),
            Err(StorageError::UserNotFound) => {
                info!(op = OP, "user not found");
                Err(AuthError::UserNotFound)
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to get user");
                Err(e.into())
            }
        }
    }

    pub async fn admin(&self, email: &str) -> Result<Admin, AuthError> {
        const OP: &str = "services.user_info.admin";

        match self.admins.find_admin_by_email(email).await {
            Ok(admin) => Ok(admin),
            Err(StorageError::AdminNotFound) => {
                info!(op = OP, "admin not found");
                Err(AuthError::AdminNotFound)
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to get admin");
                Err(e.into())
            }
        }
    }
}
