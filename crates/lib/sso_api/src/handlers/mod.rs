//! RPC handlers, one module per service.

pub mod auth;
pub mod permission;
pub mod user_info;

use axum::BoxError;
use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use tower::timeout::error::Elapsed;
use tracing::{error, info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::interceptor::CallContext;
use crate::rpc::Method;

/// Fallback for paths outside the method table.
///
/// Still runs the chain so the rejection comes from the validation stage.
pub async fn unknown_method(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> ApiError {
    reject(&state, Method::from_path(uri.path()), &uri, &headers).await
}

/// Fallback for known method paths called with a verb other than `POST`.
///
/// Only `POST` names a method, so the chain sees no method at all.
pub async fn wrong_verb(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> ApiError {
    reject(&state, None, &uri, &headers).await
}

async fn reject(
    state: &AppState,
    method: Option<Method>,
    uri: &Uri,
    headers: &HeaderMap,
) -> ApiError {
    let mut ctx = CallContext::new(method, headers);
    match state.chain.run(&mut ctx).await {
        Err(e) => e,
        Ok(()) => {
            warn!(path = uri.path(), "unrouted call passed the chain");
            ApiError::Unimplemented("method not found".into())
        }
    }
}

/// Maps failures of the transport middleware into the error taxonomy.
///
/// The in-flight handler future has already been dropped when this runs.
pub async fn transport_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        info!("call abandoned at deadline");
        ApiError::DeadlineExceeded
    } else {
        error!(error = %err, "transport middleware failed");
        ApiError::Internal(err.to_string())
    }
}
