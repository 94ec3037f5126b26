//! The RPC method table and the per-call extractor.

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use sso_core::models::auth::Level;

use crate::AppState;
use crate::error::ApiError;
use crate::interceptor::{AuthDecision, CallContext, Validate};

/// Upper bound on a request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Every method the service exposes. Anything else is unimplemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Login,
    Register,
    RegisterApp,
    User,
    Admin,
    AddAdmin,
    DeleteAdmin,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Login,
        Method::Register,
        Method::RegisterApp,
        Method::User,
        Method::Admin,
        Method::AddAdmin,
        Method::DeleteAdmin,
    ];

    /// Full method identifier, also the HTTP route.
    pub fn path(self) -> &'static str {
        match self {
            Method::Login => "/auth.Auth/Login",
            Method::Register => "/auth.Auth/Register",
            Method::RegisterApp => "/auth.Auth/RegisterApp",
            Method::User => "/userInfo.UserInfo/User",
            Method::Admin => "/userInfo.UserInfo/Admin",
            Method::AddAdmin => "/permission.Permission/AddAdmin",
            Method::DeleteAdmin => "/permission.Permission/DeleteAdmin",
        }
    }

    pub fn from_path(path: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.path() == path)
    }

    /// Minimum privilege level, or `None` when the method is open.
    pub fn required_level(self) -> Option<Level> {
        match self {
            Method::Login | Method::Register | Method::RegisterApp => None,
            Method::User | Method::Admin | Method::AddAdmin | Method::DeleteAdmin => {
                Some(Level::ADMIN)
            }
        }
    }
}

/// A typed request body bound to one method.
pub trait RpcRequest: Validate + DeserializeOwned + Default + Send + Sync + 'static {
    const METHOD: Method;
}

/// A request that has passed the interceptor chain.
///
/// Gated handlers must call `decision.require()` before doing any work.
pub struct Call<R> {
    pub request: R,
    pub decision: AuthDecision,
}

impl<R: RpcRequest> FromRequest<AppState> for Call<R> {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| ApiError::InvalidArgument("unreadable request body".into()))?;

        // An empty body is an empty message; validation reports what is missing.
        let request: R = if body.is_empty() {
            R::default()
        } else {
            serde_json::from_slice(&body)
                .map_err(|_| ApiError::InvalidArgument("malformed request body".into()))?
        };

        let mut ctx = CallContext::new(Some(R::METHOD), &parts.headers).with_request(&request);
        state.chain.run(&mut ctx).await?;
        let decision = ctx.into_decision();

        Ok(Call { request, decision })
    }
}
