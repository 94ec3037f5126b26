//! `permission.Permission` handlers. Both require an admin caller.

use axum::Json;
use axum::extract::State;
use tracing::info;

use crate::AppState;
use crate::error::ApiResult;
use crate::models::{AddAdminRequest, AddAdminResponse, DeleteAdminRequest, DeleteAdminResponse};
use crate::rpc::Call;

/// `POST /permission.Permission/AddAdmin`
pub async fn add_admin(
    State(state): State<AppState>,
    call: Call<AddAdminRequest>,
) -> ApiResult<Json<AddAdminResponse>> {
    let principal = call.decision.require()?;
    let admin_id = state.permissions.add_admin(&call.request.email).await?;
    info!(caller = principal.id, admin_id, "admin granted");
    Ok(Json(AddAdminResponse {}))
}

/// `POST /permission.Permission/DeleteAdmin`
pub async fn delete_admin(
    State(state): State<AppState>,
    call: Call<DeleteAdminRequest>,
) -> ApiResult<Json<DeleteAdminResponse>> {
    let principal = call.decision.require()?;
    state.permissions.delete_admin(&call.request.email).await?;
    info!(caller = principal.id, "admin revoked");
    Ok(Json(DeleteAdminResponse {}))
}
