//! Structural request validation.
//!
//! Runs first in the chain. Unknown methods and requests with missing fields
//! are rejected before any credential is looked at.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CallContext, Interceptor, Validate};
use crate::error::ApiError;
use crate::models::{
    AddAdminRequest, AdminRequest, DeleteAdminRequest, LoginRequest, RegisterAppRequest,
    RegisterRequest, UserRequest,
};

const EMAIL_REQUIRED: &str = "email is required";
const PASSWORD_REQUIRED: &str = "password is required";
const NAME_REQUIRED: &str = "name is required";
const APP_ID_REQUIRED: &str = "app_id is required";

fn require(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidArgument(message.into()));
    }
    Ok(())
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.email, EMAIL_REQUIRED)?;
        require(&self.password, PASSWORD_REQUIRED)?;
        if self.app_id <= 0 {
            return Err(ApiError::InvalidArgument(APP_ID_REQUIRED.into()));
        }
        Ok(())
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.email, EMAIL_REQUIRED)?;
        require(&self.password, PASSWORD_REQUIRED)
    }
}

impl Validate for RegisterAppRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.name, NAME_REQUIRED)
    }
}

impl Validate for UserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.email, EMAIL_REQUIRED)
    }
}

impl Validate for AdminRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.email, EMAIL_REQUIRED)
    }
}

impl Validate for AddAdminRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.email, EMAIL_REQUIRED)
    }
}

impl Validate for DeleteAdminRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&self.email, EMAIL_REQUIRED)
    }
}

/// Rejects unknown methods and incomplete requests.
pub struct ValidationStage;

#[async_trait]
impl Interceptor for ValidationStage {
    async fn intercept(&self, ctx: &mut CallContext<'_>) -> Result<(), ApiError> {
        let Some(method) = ctx.method else {
            warn!("method not found");
            return Err(ApiError::Unimplemented("method not found".into()));
        };

        let Some(request) = ctx.request else {
            warn!(method = method.path(), "request missing");
            return Err(ApiError::InvalidArgument("request body is required".into()));
        };

        request.validate().inspect_err(|e| {
            warn!(method = method.path(), error = %e, "validation error");
        })?;

        debug!(method = method.path(), "request validated");
        Ok(())
    }

    fn name(&self) -> &str {
        "ValidationStage"
    }
}
