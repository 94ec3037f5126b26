//! Login and registration flows.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::auth::{AuthError, password, secret, token};
use crate::models::auth::Level;
use crate::storage::{AdminStore, AppStore, StorageError, UserStore};

/// Upper bound on API key generation attempts when a key collides.
const MAX_KEY_ATTEMPTS: usize = 8;

/// Hashed once per service and compared against when the email is unknown.
const PLACEHOLDER_PASSWORD: &str = "placeholder-password";

/// Result of registering an application.
///
/// `api_key` is shown to the caller once and only its digest is stored.
pub struct RegisteredApp {
    pub id: i64,
    pub api_key: String,
    pub secret: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    admins: Arc<dyn AdminStore>,
    apps: Arc<dyn AppStore>,
    token_ttl: Duration,
    bcrypt_cost: u32,
    placeholder_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        admins: Arc<dyn AdminStore>,
        apps: Arc<dyn AppStore>,
        token_ttl: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            admins,
            apps,
            token_ttl,
            bcrypt_cost,
            placeholder_hash: OnceCell::new(),
        }
    }

    /// Authenticate with email + password and mint a token signed for `app_id`.
    ///
    /// An unknown email, a wrong password and an unknown application all fail
    /// with the same `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str, app_id: i64) -> Result<String, AuthError> {
        const OP: &str = "services.auth.login";

        let user = match self.users.find_user_by_email(email).await {
            Ok(user) => user,
            Err(StorageError::UserNotFound) => {
                info!(op = OP, "user not found");
                self.verify_placeholder(password).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to get user");
                return Err(e.into());
            }
        };

        if !password::verify_password_async(password.to_string(), user.pass_hash.clone()).await? {
            info!(op = OP, user_id = user.id, "invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let app = match self.apps.find_app_by_id(app_id).await {
            Ok(app) => app,
            Err(StorageError::AppNotFound) => {
                info!(op = OP, app_id, "app not found");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to get app");
                return Err(e.into());
            }
        };

        let level = match self.admins.find_admin_by_email(email).await {
            Ok(admin) => admin.level,
            Err(StorageError::AdminNotFound) => Level::USER,
            Err(e) => {
                error!(op = OP, error = %e, "failed to get admin");
                return Err(e.into());
            }
        };

        // Best effort: a failed visit update never changes the issued level.
        if let Err(e) = self.users.update_last_visit(email, Utc::now()).await {
            warn!(op = OP, user_id = user.id, error = %e, "failed to update visit time");
        }

        let token = token::issue(&user, &app, level, self.token_ttl).map_err(|e| {
            error!(op = OP, error = %e, "failed to generate token");
            AuthError::from(e)
        })?;

        info!(op = OP, user_id = user.id, app_id, %level, "user logged in");
        Ok(token)
    }

    /// Register a new user and return its ID.
    pub async fn register_new_user(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        const OP: &str = "services.auth.register_new_user";

        let pass_hash = password::hash_password_async(password.to_string(), self.bcrypt_cost)
            .await
            .inspect_err(|e| error!(op = OP, error = %e, "failed to hash password"))?;

        match self.users.save_user(email, &pass_hash).await {
            Ok(id) => {
                info!(op = OP, user_id = id, "user registered");
                Ok(id)
            }
            Err(StorageError::UserExists) => {
                info!(op = OP, "user already exists");
                Err(AuthError::UserAlreadyExists)
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to save user");
                Err(e.into())
            }
        }
    }

    /// Register a new application with a fresh API key and signing secret.
    pub async fn register_new_app(&self, name: &str) -> Result<RegisteredApp, AuthError> {
        const OP: &str = "services.auth.register_new_app";

        let (api_key, key_digest) = self.unused_api_key().await?;
        let signing_secret = secret::generate_signing_secret()?;

        match self.apps.save_app(name, &key_digest, &signing_secret).await {
            Ok(id) => {
                info!(op = OP, app_id = id, "app registered");
                Ok(RegisteredApp {
                    id,
                    api_key,
                    secret: signing_secret,
                })
            }
            Err(StorageError::AppExists) => {
                warn!(op = OP, "app already exists");
                Err(AuthError::AppAlreadyExists)
            }
            Err(e) => {
                error!(op = OP, error = %e, "failed to save app");
                Err(e.into())
            }
        }
    }

    /// Run one bcrypt comparison at the configured cost, so an unknown email
    /// takes as long as a wrong password.
    async fn verify_placeholder(&self, password: &str) {
        let hash = self
            .placeholder_hash
            .get_or_try_init(|| {
                password::hash_password_async(PLACEHOLDER_PASSWORD.to_string(), self.bcrypt_cost)
            })
            .await;
        match hash {
            Ok(hash) => {
                let _ = password::verify_password_async(password.to_string(), hash.clone()).await;
            }
            Err(e) => warn!(error = %e, "failed to hash placeholder password"),
        }
    }

    /// Generate an API key whose digest is not yet registered.
    async fn unused_api_key(&self) -> Result<(String, String), AuthError> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = secret::generate_api_key()?;
            let digest = secret::digest_api_key(&key);
            match self.apps.find_app_by_key(&digest).await {
                Err(StorageError::AppNotFound) => return Ok((key, digest)),
                Ok(_) => warn!("generated api key collides, retrying"),
                Err(e) => return Err(e.into()),
            }
        }
        Err(AuthError::Internal(format!(
            "no unused api key after {MAX_KEY_ATTEMPTS} attempts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::DateTime;

    use super::*;
    use crate::models::auth::User;
    use crate::storage::memory::MemoryStorage;

    const TEST_COST: u32 = 4;
    const TTL: Duration = Duration::from_secs(3600);

    fn service(store: Arc<MemoryStorage>) -> AuthService {
        AuthService::new(store.clone(), store.clone(), store, TTL, TEST_COST)
    }

    #[tokio::test]
    async fn login_issues_token_for_registered_user() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store.clone());

        let user_id = auth.register_new_user("a@x.com", "pw123").await.unwrap();
        let app = auth.register_new_app("billing").await.unwrap();
        let raw = auth.login("a@x.com", "pw123", app.id).await.unwrap();

        let claims = token::parse(&raw, app.secret.as_bytes()).unwrap();
        assert_eq!(claims.uid, user_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.level, Level::USER);
        assert_eq!(claims.app_id, app.id);
    }

    #[tokio::test]
    async fn login_reflects_admin_grant() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store.clone());

        auth.register_new_user("a@x.com", "pw123").await.unwrap();
        let app = auth.register_new_app("billing").await.unwrap();
        store.add_admin("a@x.com", Level::ADMIN).await.unwrap();

        let raw = auth.login("a@x.com", "pw123", app.id).await.unwrap();
        let claims = token::parse(&raw, app.secret.as_bytes()).unwrap();
        assert_eq!(claims.level, Level::ADMIN);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store);

        auth.register_new_user("a@x.com", "pw123").await.unwrap();
        let app = auth.register_new_app("billing").await.unwrap();

        assert!(matches!(
            auth.login("a@x.com", "wrong", app.id).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("ghost@x.com", "pw123", app.id).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("a@x.com", "pw123", app.id + 100).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_password_check() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store);
        let app = auth.register_new_app("billing").await.unwrap();
        assert!(!auth.placeholder_hash.initialized());

        assert!(matches!(
            auth.login("ghost@x.com", "pw123", app.id).await,
            Err(AuthError::InvalidCredentials)
        ));

        let hash = auth.placeholder_hash.get().unwrap();
        assert!(hash.starts_with(&format!("$2b${TEST_COST:02}$")));
        assert!(password::verify_password(PLACEHOLDER_PASSWORD, hash).unwrap());
    }

    #[tokio::test]
    async fn login_updates_visit_time() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store.clone());

        auth.register_new_user("a@x.com", "pw123").await.unwrap();
        let before = store.find_user_by_email("a@x.com").await.unwrap().visited_at;
        let app = auth.register_new_app("billing").await.unwrap();
        auth.login("a@x.com", "pw123", app.id).await.unwrap();

        let after = store.find_user_by_email("a@x.com").await.unwrap().visited_at;
        assert!(after >= before);
    }

    /// Delegates to the memory store but refuses visit-time updates.
    struct StaleVisits(Arc<MemoryStorage>);

    #[async_trait]
    impl UserStore for StaleVisits {
        async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, StorageError> {
            self.0.save_user(email, pass_hash).await
        }
        async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError> {
            self.0.find_user_by_email(email).await
        }
        async fn update_last_visit(&self, _: &str, _: DateTime<Utc>) -> Result<(), StorageError> {
            Err(StorageError::Database(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn visit_update_failure_keeps_the_admin_level() {
        let store = Arc::new(MemoryStorage::new());
        let auth = AuthService::new(
            Arc::new(StaleVisits(store.clone())),
            store.clone(),
            store.clone(),
            TTL,
            TEST_COST,
        );

        auth.register_new_user("a@x.com", "pw123").await.unwrap();
        store.add_admin("a@x.com", Level::ADMIN).await.unwrap();
        let app = auth.register_new_app("billing").await.unwrap();

        let raw = auth.login("a@x.com", "pw123", app.id).await.unwrap();
        let claims = token::parse(&raw, app.secret.as_bytes()).unwrap();
        assert_eq!(claims.level, Level::ADMIN);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service(Arc::new(MemoryStorage::new()));
        auth.register_new_user("a@x.com", "pw123").await.unwrap();
        assert!(matches!(
            auth.register_new_user("a@x.com", "other").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn duplicate_app_name_is_rejected() {
        let auth = service(Arc::new(MemoryStorage::new()));
        auth.register_new_app("billing").await.unwrap();
        assert!(matches!(
            auth.register_new_app("billing").await,
            Err(AuthError::AppAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn registered_app_key_authenticates() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store.clone());
        let app = auth.register_new_app("billing").await.unwrap();

        let found = store
            .find_app_by_key(&secret::digest_api_key(&app.api_key))
            .await
            .unwrap();
        assert_eq!(found.id, app.id);
        assert_eq!(found.secret, app.secret);
        assert_ne!(app.api_key, app.secret);
    }
}
