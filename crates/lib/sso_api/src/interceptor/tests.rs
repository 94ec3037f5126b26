use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
use chrono::Utc;
use sso_core::auth::secret::digest_api_key;
use sso_core::auth::token;
use sso_core::auth::verifier::{CredentialVerifier, PrincipalKind};
use sso_core::models::auth::{App, Level, User};
use sso_core::storage::AppStore;
use sso_core::storage::memory::MemoryStorage;

use super::authentication::AuthenticationStage;
use super::validation::ValidationStage;
use super::*;
use crate::models::{AddAdminRequest, LoginRequest, RegisterAppRequest};

/// Counts how often it runs.
struct Counter(Arc<AtomicU32>);

#[async_trait]
impl Interceptor for Counter {
    async fn intercept(&self, _ctx: &mut CallContext<'_>) -> Result<(), ApiError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "Counter"
    }
}

async fn fixture() -> (CredentialVerifier, App) {
    let store = Arc::new(MemoryStorage::new());
    let id = store
        .save_app("billing", &digest_api_key("app-key"), "app-secret")
        .await
        .unwrap();
    let app = store.find_app_by_id(id).await.unwrap();
    (CredentialVerifier::new(store), app)
}

fn token_for(app: &App, level: Level) -> String {
    let now = Utc::now();
    let user = User {
        id: 1,
        email: "a@x.com".into(),
        pass_hash: String::new(),
        created_at: now,
        visited_at: now,
    };
    token::issue(&user, app, level, Duration::from_secs(60)).unwrap()
}

fn headers(authorization: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
    headers
}

fn add_admin() -> AddAdminRequest {
    AddAdminRequest {
        email: "b@x.com".into(),
    }
}

async fn decide(
    verifier: CredentialVerifier,
    headers: &HeaderMap,
    request: &dyn Validate,
    method: Method,
) -> AuthDecision {
    let chain = default_chain(verifier);
    let mut ctx = CallContext::new(Some(method), headers).with_request(request);
    chain.run(&mut ctx).await.unwrap();
    ctx.into_decision()
}

#[tokio::test]
async fn unknown_method_is_unimplemented_and_stops_the_chain() {
    let count = Arc::new(AtomicU32::new(0));
    let chain = InterceptorChain::new(vec![
        Arc::new(ValidationStage),
        Arc::new(Counter(count.clone())),
    ]);

    let headers = HeaderMap::new();
    let mut ctx = CallContext::new(None, &headers);
    assert_eq!(
        chain.run(&mut ctx).await,
        Err(ApiError::Unimplemented("method not found".into()))
    );
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_request_never_reaches_authentication() {
    let count = Arc::new(AtomicU32::new(0));
    let chain = InterceptorChain::new(vec![
        Arc::new(ValidationStage),
        Arc::new(Counter(count.clone())),
    ]);

    let headers = HeaderMap::new();
    let request = RegisterAppRequest::default();
    let mut ctx = CallContext::new(Some(Method::RegisterApp), &headers).with_request(&request);
    assert_eq!(
        chain.run(&mut ctx).await,
        Err(ApiError::InvalidArgument("name is required".into()))
    );
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn login_requires_an_application() {
    let (verifier, _) = fixture().await;
    let chain = default_chain(verifier);
    let request = LoginRequest {
        email: "a@x.com".into(),
        password: "pw123".into(),
        app_id: 0,
    };
    let headers = HeaderMap::new();
    let mut ctx = CallContext::new(Some(Method::Login), &headers).with_request(&request);
    assert_eq!(
        chain.run(&mut ctx).await,
        Err(ApiError::InvalidArgument("app_id is required".into()))
    );
}

#[tokio::test]
async fn open_method_skips_authentication() {
    let (verifier, _) = fixture().await;
    let request = RegisterAppRequest {
        name: "reports".into(),
    };
    let decision = decide(verifier, &HeaderMap::new(), &request, Method::RegisterApp).await;
    assert_eq!(decision, AuthDecision::Skipped);
}

#[tokio::test]
async fn gated_method_without_credentials_is_invalid_argument() {
    let (verifier, _) = fixture().await;
    let decision = decide(verifier, &HeaderMap::new(), &add_admin(), Method::AddAdmin).await;
    assert_eq!(
        decision,
        AuthDecision::Denied(ApiError::InvalidArgument("missing credentials".into()))
    );
}

#[tokio::test]
async fn unknown_scheme_is_unauthenticated() {
    let (verifier, app) = fixture().await;
    let raw = token_for(&app, Level::ADMIN);
    let decision = decide(
        verifier,
        &headers(&format!("Basic {raw}")),
        &add_admin(),
        Method::AddAdmin,
    )
    .await;
    assert!(matches!(
        decision,
        AuthDecision::Denied(ApiError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn plain_user_is_denied() {
    let (verifier, app) = fixture().await;
    let raw = token_for(&app, Level::USER);
    let decision = decide(
        verifier,
        &headers(&format!("Bearer {raw}")),
        &add_admin(),
        Method::AddAdmin,
    )
    .await;
    assert!(matches!(
        decision,
        AuthDecision::Denied(ApiError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn admin_user_is_granted() {
    let (verifier, app) = fixture().await;
    let raw = token_for(&app, Level::ADMIN);
    let decision = decide(
        verifier,
        &headers(&format!("bearer {raw}")),
        &add_admin(),
        Method::AddAdmin,
    )
    .await;

    let principal = decision.require().unwrap();
    assert_eq!(principal.kind, PrincipalKind::User);
    assert_eq!(principal.level, Level::ADMIN);
    assert_eq!(principal.app_id, app.id);
}

#[tokio::test]
async fn application_key_is_granted() {
    let (verifier, app) = fixture().await;
    let decision = decide(
        verifier,
        &headers("ApiKey app-key"),
        &add_admin(),
        Method::DeleteAdmin,
    )
    .await;

    let principal = decision.require().unwrap();
    assert_eq!(principal.kind, PrincipalKind::App);
    assert_eq!(principal.id, app.id);
    assert_eq!(principal.level, Level::APPLICATION);
}

#[tokio::test]
async fn wrong_api_key_is_unauthenticated() {
    let (verifier, _) = fixture().await;
    let decision = decide(
        verifier,
        &headers("ApiKey other-key"),
        &add_admin(),
        Method::AddAdmin,
    )
    .await;
    assert_eq!(
        decision.require(),
        Err(ApiError::Unauthenticated("invalid token or key".into()))
    );
}

#[test]
fn skipped_decision_fails_closed() {
    assert!(matches!(
        AuthDecision::Skipped.require(),
        Err(ApiError::Unauthenticated(_))
    ));
}
