//! Credential resolution and the privilege gate.

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use sso_core::auth::credential::Credential;
use sso_core::auth::verifier::{CredentialVerifier, VerifyError};
use tracing::{debug, error, info, warn};

use super::{AuthDecision, CallContext, Interceptor};
use crate::error::ApiError;

/// Resolves the caller of gated methods and records the outcome.
pub struct AuthenticationStage {
    verifier: CredentialVerifier,
}

impl AuthenticationStage {
    pub fn new(verifier: CredentialVerifier) -> Self {
        Self { verifier }
    }

    async fn decide(&self, ctx: &CallContext<'_>) -> AuthDecision {
        let Some(method) = ctx.method else {
            return AuthDecision::Skipped;
        };
        let Some(required) = method.required_level() else {
            debug!(method = method.path(), "open method, authentication skipped");
            return AuthDecision::Skipped;
        };

        let Some(raw) = ctx.headers.get(AUTHORIZATION) else {
            warn!(method = method.path(), "missing credentials");
            return AuthDecision::Denied(ApiError::InvalidArgument("missing credentials".into()));
        };

        let credential = match raw.to_str().ok().map(str::parse::<Credential>) {
            Some(Ok(credential)) => credential,
            Some(Err(e)) => {
                warn!(method = method.path(), error = %e, "unusable credential");
                return AuthDecision::Denied(unauthenticated());
            }
            None => {
                warn!(method = method.path(), "credential is not valid ascii");
                return AuthDecision::Denied(unauthenticated());
            }
        };

        let principal = match self.verifier.resolve(&credential).await {
            Ok(principal) => principal,
            Err(VerifyError::Unauthenticated) => {
                warn!(method = method.path(), "invalid token or key");
                return AuthDecision::Denied(unauthenticated());
            }
            Err(VerifyError::Internal(detail)) => {
                error!(method = method.path(), error = %detail, "credential lookup failed");
                return AuthDecision::Denied(ApiError::Internal(detail));
            }
        };

        if principal.level < required {
            warn!(
                method = method.path(),
                level = %principal.level,
                required = %required,
                "permission denied"
            );
            return AuthDecision::Denied(ApiError::PermissionDenied(
                "insufficient privilege".into(),
            ));
        }

        info!(
            method = method.path(),
            kind = ?principal.kind,
            id = principal.id,
            app_id = principal.app_id,
            level = %principal.level,
            "caller authenticated"
        );
        AuthDecision::Granted(principal)
    }
}

fn unauthenticated() -> ApiError {
    ApiError::Unauthenticated("invalid token or key".into())
}

#[async_trait]
impl Interceptor for AuthenticationStage {
    async fn intercept(&self, ctx: &mut CallContext<'_>) -> Result<(), ApiError> {
        ctx.decision = self.decide(ctx).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "AuthenticationStage"
    }
}
