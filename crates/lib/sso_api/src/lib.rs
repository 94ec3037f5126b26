//! # sso_api
//!
//! RPC surface for SSO: the method table, the interceptor chain that gates
//! every call, the handlers and the router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod interceptor;
pub mod models;
pub mod rpc;

use std::sync::Arc;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::routing::post;
use sso_core::auth::verifier::CredentialVerifier;
use sso_core::services::{AuthService, PermissionService, UserInfoService};
use sso_core::storage::{AdminStore, AppStore, UserStore};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, permission, user_info};
use crate::interceptor::{InterceptorChain, default_chain};
use crate::rpc::Method;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub auth: Arc<AuthService>,
    pub user_info: Arc<UserInfoService>,
    pub permissions: Arc<PermissionService>,
    pub chain: Arc<InterceptorChain>,
}

impl AppState {
    /// Wire the services and the default chain over one storage backend.
    pub fn new<S>(config: ApiConfig, storage: Arc<S>) -> Self
    where
        S: UserStore + AdminStore + AppStore + 'static,
    {
        let users: Arc<dyn UserStore> = storage.clone();
        let admins: Arc<dyn AdminStore> = storage.clone();
        let apps: Arc<dyn AppStore> = storage;

        let auth = AuthService::new(
            users.clone(),
            admins.clone(),
            apps.clone(),
            config.token_ttl(),
            config.bcrypt_cost,
        );

        Self {
            auth: Arc::new(auth),
            user_info: Arc::new(UserInfoService::new(users, admins.clone())),
            permissions: Arc::new(PermissionService::new(admins)),
            chain: Arc::new(default_chain(CredentialVerifier::new(apps))),
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Expiry drops the handler future and answers `DeadlineExceeded`.
    let deadline = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handlers::transport_error))
        .layer(TimeoutLayer::new(state.config.request_timeout()));

    Router::new()
        .route(Method::Login.path(), post(auth::login))
        .route(Method::Register.path(), post(auth::register))
        .route(Method::RegisterApp.path(), post(auth::register_app))
        .route(Method::User.path(), post(user_info::user))
        .route(Method::Admin.path(), post(user_info::admin))
        .route(Method::AddAdmin.path(), post(permission::add_admin))
        .route(Method::DeleteAdmin.path(), post(permission::delete_admin))
        .fallback(handlers::unknown_method)
        .method_not_allowed_fallback(handlers::wrong_verb)
        .layer(deadline)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
