//! Credential verification.
//!
//! Resolves a tagged [`Credential`] into the [`Principal`] making the call.
//! User tokens are verified with the secret of the application named in the
//! token header; API keys are looked up by digest.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use super::credential::Credential;
use super::secret::digest_api_key;
use super::token;
use crate::models::auth::Level;
use crate::storage::{AppStore, StorageError};

/// Kind of authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalKind {
    App,
    User,
}

/// The authenticated actor making a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub kind: PrincipalKind,
    /// User ID for users, application ID for applications.
    pub id: i64,
    /// Application the principal acts for.
    pub app_id: i64,
    pub level: Level,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid token or key")]
    Unauthenticated,

    #[error("credential lookup failed: {0}")]
    Internal(String),
}

/// Resolves credentials against the application store.
#[derive(Clone)]
pub struct CredentialVerifier {
    apps: Arc<dyn AppStore>,
}

impl CredentialVerifier {
    pub fn new(apps: Arc<dyn AppStore>) -> Self {
        Self { apps }
    }

    /// Resolve `credential` at the current time.
    pub async fn resolve(&self, credential: &Credential) -> Result<Principal, VerifyError> {
        self.resolve_at(credential, Utc::now().timestamp()).await
    }

    /// Resolve `credential` as if the current unix time were `now`.
    pub async fn resolve_at(
        &self,
        credential: &Credential,
        now: i64,
    ) -> Result<Principal, VerifyError> {
        match credential {
            Credential::User(raw) => self.resolve_user(raw, now).await,
            Credential::App(key) => self.resolve_app(key).await,
        }
    }

    async fn resolve_user(&self, raw: &str, now: i64) -> Result<Principal, VerifyError> {
        let app_id = token::key_id(raw).map_err(|e| {
            debug!(error = %e, "unreadable token header");
            VerifyError::Unauthenticated
        })?;

        let app = match self.apps.find_app_by_id(app_id).await {
            Ok(app) => app,
            Err(StorageError::AppNotFound) => {
                debug!(app_id, "token names an unknown application");
                return Err(VerifyError::Unauthenticated);
            }
            Err(e) => return Err(VerifyError::Internal(e.to_string())),
        };

        let claims = token::parse_at(raw, app.secret.as_bytes(), now).map_err(|e| {
            debug!(app_id, error = %e, "token rejected");
            VerifyError::Unauthenticated
        })?;

        if claims.app_id != app.id {
            debug!(app_id, claimed = claims.app_id, "token kid does not match claims");
            return Err(VerifyError::Unauthenticated);
        }

        Ok(Principal {
            kind: PrincipalKind::User,
            id: claims.uid,
            app_id: app.id,
            level: claims.level,
        })
    }

    async fn resolve_app(&self, key: &str) -> Result<Principal, VerifyError> {
        match self.apps.find_app_by_key(&digest_api_key(key)).await {
            Ok(app) => Ok(Principal {
                kind: PrincipalKind::App,
                id: app.id,
                app_id: app.id,
                level: Level::APPLICATION,
            }),
            Err(StorageError::AppNotFound) => Err(VerifyError::Unauthenticated),
            Err(e) => Err(VerifyError::Internal(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::models::auth::{App, TokenClaims, User};
    use crate::storage::memory::MemoryStorage;

    const NOW: i64 = 1_700_000_000;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 9,
            email: "a@x.com".into(),
            pass_hash: String::new(),
            created_at: now,
            visited_at: now,
        }
    }

    async fn setup() -> (Arc<MemoryStorage>, App, App) {
        let store = Arc::new(MemoryStorage::new());
        let a = store
            .save_app("alpha", &digest_api_key("key-a"), "secret-a")
            .await
            .unwrap();
        let b = store
            .save_app("beta", &digest_api_key("key-b"), "secret-b")
            .await
            .unwrap();
        let a = store.find_app_by_id(a).await.unwrap();
        let b = store.find_app_by_id(b).await.unwrap();
        (store, a, b)
    }

    #[tokio::test]
    async fn user_token_resolves_to_its_level() {
        let (store, alpha, _) = setup().await;
        let verifier = CredentialVerifier::new(store);
        let raw =
            token::issue_at(&user(), &alpha, Level::ADMIN, Duration::from_secs(60), NOW).unwrap();

        let principal = verifier
            .resolve_at(&Credential::User(raw), NOW)
            .await
            .unwrap();
        assert_eq!(
            principal,
            Principal {
                kind: PrincipalKind::User,
                id: 9,
                app_id: alpha.id,
                level: Level::ADMIN,
            }
        );
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated() {
        let (store, alpha, _) = setup().await;
        let verifier = CredentialVerifier::new(store);
        let raw =
            token::issue_at(&user(), &alpha, Level::ADMIN, Duration::from_secs(60), NOW).unwrap();

        assert_eq!(
            verifier
                .resolve_at(&Credential::User(raw), NOW + 60)
                .await,
            Err(VerifyError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn kid_swapped_to_another_tenant_is_rejected() {
        let (store, alpha, beta) = setup().await;
        let verifier = CredentialVerifier::new(store);

        // Signed with alpha's secret but claiming beta in the header.
        let claims = TokenClaims {
            uid: 9,
            email: "a@x.com".into(),
            level: Level::ADMIN,
            app_id: beta.id,
            exp: NOW + 60,
            iat: NOW,
        };
        let header = Header {
            kid: Some(beta.id.to_string()),
            ..Header::new(token::ALGORITHM)
        };
        let raw = encode(
            &header,
            &claims,
            &EncodingKey::from_secret(alpha.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            verifier.resolve_at(&Credential::User(raw), NOW).await,
            Err(VerifyError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn claims_for_another_app_are_rejected() {
        let (store, alpha, beta) = setup().await;
        let verifier = CredentialVerifier::new(store);

        // Correctly signed by alpha, but the payload names beta.
        let claims = TokenClaims {
            uid: 9,
            email: "a@x.com".into(),
            level: Level::ADMIN,
            app_id: beta.id,
            exp: NOW + 60,
            iat: NOW,
        };
        let header = Header {
            kid: Some(alpha.id.to_string()),
            ..Header::new(token::ALGORITHM)
        };
        let raw = encode(
            &header,
            &claims,
            &EncodingKey::from_secret(alpha.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            verifier.resolve_at(&Credential::User(raw), NOW).await,
            Err(VerifyError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn api_key_resolves_to_application() {
        let (store, _, beta) = setup().await;
        let verifier = CredentialVerifier::new(store);

        let principal = verifier
            .resolve(&Credential::App("key-b".into()))
            .await
            .unwrap();
        assert_eq!(principal.kind, PrincipalKind::App);
        assert_eq!(principal.id, beta.id);
        assert_eq!(principal.level, Level::APPLICATION);

        assert_eq!(
            verifier.resolve(&Credential::App("key-z".into())).await,
            Err(VerifyError::Unauthenticated)
        );
    }

    struct BrokenStore;

    #[async_trait]
    impl AppStore for BrokenStore {
        async fn save_app(&self, _: &str, _: &str, _: &str) -> Result<i64, StorageError> {
            Err(StorageError::Database(sqlx::Error::PoolClosed))
        }
        async fn find_app_by_id(&self, _: i64) -> Result<App, StorageError> {
            Err(StorageError::Database(sqlx::Error::PoolClosed))
        }
        async fn find_app_by_key(&self, _: &str) -> Result<App, StorageError> {
            Err(StorageError::Database(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn lookup_failure_is_internal() {
        let verifier = CredentialVerifier::new(Arc::new(BrokenStore));
        assert!(matches!(
            verifier.resolve(&Credential::App("key".into())).await,
            Err(VerifyError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthenticated() {
        let (store, _, _) = setup().await;
        let verifier = CredentialVerifier::new(store);
        assert_eq!(
            verifier.resolve(&Credential::User("nope".into())).await,
            Err(VerifyError::Unauthenticated)
        );
    }
}
