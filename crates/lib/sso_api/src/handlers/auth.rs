//! `auth.Auth` handlers. All three methods are open.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::ApiResult;
use crate::models::{
    LoginRequest, LoginResponse, RegisterAppRequest, RegisterAppResponse, RegisterRequest,
    RegisterResponse,
};
use crate::rpc::Call;

/// `POST /auth.Auth/Login`
pub async fn login(
    State(state): State<AppState>,
    call: Call<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let req = call.request;
    let token = state.auth.login(&req.email, &req.password, req.app_id).await?;
    Ok(Json(LoginResponse { token }))
}

/// `POST /auth.Auth/Register`
pub async fn register(
    State(state): State<AppState>,
    call: Call<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let req = call.request;
    let user_id = state.auth.register_new_user(&req.email, &req.password).await?;
    Ok(Json(RegisterResponse { user_id }))
}

/// `POST /auth.Auth/RegisterApp`
pub async fn register_app(
    State(state): State<AppState>,
    call: Call<RegisterAppRequest>,
) -> ApiResult<Json<RegisterAppResponse>> {
    let app = state.auth.register_new_app(&call.request.name).await?;
    Ok(Json(RegisterAppResponse {
        app_id: app.id,
        api_key: app.api_key,
        secret: app.secret,
    }))
}
