//! `userInfo.UserInfo` handlers. Both require an admin caller.

use axum::Json;
use axum::extract::State;
use tracing::debug;

use crate::AppState;
use crate::error::ApiResult;
use crate::models::{AdminRequest, AdminResponse, UserRequest, UserResponse};
use crate::rpc::Call;

/// `POST /userInfo.UserInfo/User` (admin only)
pub async fn user(
    State(state): State<AppState>,
    call: Call<UserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let principal = call.decision.require()?;
    debug!(caller = principal.id, "user lookup");
    let user = state.user_info.user(&call.request.email).await?;
    Ok(Json(user.into()))
}

/// `POST /userInfo.UserInfo/Admin` (admin only)
pub async fn admin(
    State(state): State<AppState>,
    call: Call<AdminRequest>,
) -> ApiResult<Json<AdminResponse>> {
    let principal = call.decision.require()?;
    debug!(caller = principal.id, "admin lookup");
    let admin = state.user_info.admin(&call.request.email).await?;
    Ok(Json(admin.into()))
}
