//! Wire types for every method.
//!
//! Missing JSON fields default to empty or zero so the validation stage can
//! report them instead of failing deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sso_core::models::auth::{Admin, UserProfile};

use crate::rpc::{Method, RpcRequest};

#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub app_id: i64,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterAppRequest {
    pub name: String,
}

/// Returned once; the API key cannot be recovered later.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAppResponse {
    pub app_id: i64,
    pub api_key: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub visited_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            created_at: user.created_at,
            visited_at: user.visited_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdminRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub admin_id: i64,
    pub email: String,
    pub level: u8,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            admin_id: admin.id,
            email: admin.email,
            level: admin.level.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddAdminRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddAdminResponse {}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteAdminRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeleteAdminResponse {}

impl RpcRequest for LoginRequest {
    const METHOD: Method = Method::Login;
}

impl RpcRequest for RegisterRequest {
    const METHOD: Method = Method::Register;
}

impl RpcRequest for RegisterAppRequest {
    const METHOD: Method = Method::RegisterApp;
}

impl RpcRequest for UserRequest {
    const METHOD: Method = Method::User;
}

impl RpcRequest for AdminRequest {
    const METHOD: Method = Method::Admin;
}

impl RpcRequest for AddAdminRequest {
    const METHOD: Method = Method::AddAdmin;
}

impl RpcRequest for DeleteAdminRequest {
    const METHOD: Method = Method::DeleteAdmin;
}
