//! Business services behind the RPC handlers.
//!
//! Each service translates storage sentinels into [`AuthError`] variants so
//! that raw storage errors never reach the transport layer.
//!
//! [`AuthError`]: crate::auth::AuthError

pub mod auth;
pub mod permission;
pub mod user_info;

pub use auth::{AuthService, RegisteredApp};
pub use permission::PermissionService;
pub use user_info::UserInfoService;
