//! Request extractors.
//!
//! - [`AuthUser`] / [`AdminUser`] - bearer token authentication and roles
//! - [`ApiJson`] / [`ApiPath`] - `Json` and `Path` with [`ApiError`] rejections
//!
//! [`ApiError`]: crate::error::ApiError

pub mod auth;
pub mod extract;

pub use auth::{AdminUser, AuthUser};
pub use extract::{ApiJson, ApiPath};
