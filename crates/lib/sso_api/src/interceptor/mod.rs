//! Interceptor chain run before every RPC handler.
//!
//! Stages run in order and may reject the call. The validation stage
//! short-circuits; the authentication stage never does and instead records an
//! [`AuthDecision`] which the chain hands to the handler.

pub mod authentication;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use sso_core::auth::verifier::{CredentialVerifier, Principal};

use crate::error::ApiError;
use crate::rpc::Method;

/// Structural check of a request body.
pub trait Validate: Send + Sync {
    /// Fails with `InvalidArgument` naming the first missing field.
    fn validate(&self) -> Result<(), ApiError>;
}

/// Outcome of the authentication stage, consumed by the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// The method is open; no credential was inspected.
    Skipped,
    Granted(Principal),
    Denied(ApiError),
}

impl AuthDecision {
    /// The authenticated principal, or the recorded failure.
    ///
    /// `Skipped` fails closed: a handler that needs a principal never gets
    /// one for a call the chain did not authenticate.
    pub fn require(self) -> Result<Principal, ApiError> {
        match self {
            AuthDecision::Granted(principal) => Ok(principal),
            AuthDecision::Denied(err) => Err(err),
            AuthDecision::Skipped => Err(ApiError::Unauthenticated("not authenticated".into())),
        }
    }
}

/// Per-call state threaded through the chain.
pub struct CallContext<'a> {
    /// `None` when the path names no known method.
    pub method: Option<Method>,
    pub headers: &'a HeaderMap,
    pub request: Option<&'a dyn Validate>,
    pub decision: AuthDecision,
}

impl<'a> CallContext<'a> {
    pub fn new(method: Option<Method>, headers: &'a HeaderMap) -> Self {
        Self {
            method,
            headers,
            request: None,
            decision: AuthDecision::Skipped,
        }
    }

    pub fn with_request(mut self, request: &'a dyn Validate) -> Self {
        self.request = Some(request);
        self
    }

    pub fn into_decision(self) -> AuthDecision {
        self.decision
    }
}

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Inspect the call. Return Err to reject it before the handler runs.
    async fn intercept(&self, ctx: &mut CallContext<'_>) -> Result<(), ApiError>;

    /// Stage identifier for logging.
    fn name(&self) -> &str;
}

/// Ordered interceptor stages.
pub struct InterceptorChain {
    stages: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new(stages: Vec<Arc<dyn Interceptor>>) -> Self {
        Self { stages }
    }

    /// Run every stage in order, stopping at the first rejection.
    pub async fn run(&self, ctx: &mut CallContext<'_>) -> Result<(), ApiError> {
        for stage in &self.stages {
            stage.intercept(ctx).await.inspect_err(|e| {
                tracing::debug!(stage = stage.name(), error = %e, "call rejected");
            })?;
        }
        Ok(())
    }
}

/// Validation, then authentication.
pub fn default_chain(verifier: CredentialVerifier) -> InterceptorChain {
    InterceptorChain::new(vec![
        Arc::new(validation::ValidationStage),
        Arc::new(authentication::AuthenticationStage::new(verifier)),
    ])
}

#[cfg(test)]
mod tests;
