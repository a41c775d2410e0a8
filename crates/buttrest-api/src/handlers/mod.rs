//! HTTP request handlers
//!
//! Handlers reach the device registry through [`crate::AppState`] and are
//! client-agnostic.

pub mod actuators;
pub mod devices;
pub mod health;
pub mod scan;
pub mod sensors;

use axum::http::Uri;

use crate::error::ApiError;

/// Router fallback for unknown paths
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::RouteNotFound(uri.path().to_string())
}

/// Router fallback for known paths with an unsupported method
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
