//! # sso_core
//!
//! Core domain logic for the SSO service: credential handling, token codec,
//! storage and the business services behind the RPC surface.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod services;
pub mod storage;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
