//! API error types and the problem-details envelope
//!
//! Every failure, whatever its origin, leaves the API as the same
//! `{title, status, detail, errors?}` body with content type
//! `application/problem+json`.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use buttrest_core::{ActuatorKind, ClientError};
use serde::{Deserialize, Serialize};

pub const PROBLEM_JSON: &str = "application/problem+json";

/// Index-addressed resource categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Device,
    Sensor,
    Actuator(ActuatorKind),
}

impl Resource {
    pub fn label(self) -> &'static str {
        match self {
            Resource::Device => "Device",
            Resource::Sensor => "Sensor",
            Resource::Actuator(kind) => kind.label(),
        }
    }
}

/// One offending field of a rejected payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON pointer to the field (`""` for the whole body)
    pub pointer: String,
    /// Machine-readable error code
    pub code: String,
    /// Human-readable explanation
    pub detail: String,
}

impl FieldError {
    pub fn new(pointer: impl Into<String>, code: &str, detail: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            code: code.to_string(),
            detail: detail.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(
            pointer(field),
            "required",
            format!("'{}' is required", field),
        )
    }

    pub fn invalid_type(field: &str, expected: &str) -> Self {
        Self::new(
            pointer(field),
            "invalid_type",
            format!("'{}' must be {}", field, expected),
        )
    }

    pub fn out_of_range(field: &str, detail: impl Into<String>) -> Self {
        Self::new(pointer(field), "out_of_range", detail)
    }

    pub fn invalid_body(detail: impl Into<String>) -> Self {
        Self::new("", "invalid_body", detail)
    }
}

fn pointer(field: &str) -> String {
    format!("/{}", field)
}

/// Uniform error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// API error type that converts to problem responses
#[derive(Debug)]
pub enum ApiError {
    /// 502 Bad Gateway - the hardware-control client is not connected
    NotConnected,
    /// 404 Not Found - index outside the current collection
    NotFound { resource: Resource, id: u32 },
    /// 404 Not Found - path segment that is not an index
    InvalidId { resource: Resource, raw: String },
    /// 404 Not Found - no such route
    RouteNotFound(String),
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 422 Unprocessable Entity - command payload failed validation
    InvalidCommand(Vec<FieldError>),
    /// 500 Internal Server Error - the hardware rejected a command or read
    Hardware(String),
    /// 504 Gateway Timeout - sensor read exceeded its deadline
    ReadTimeout(Duration),
    /// 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotConnected => StatusCode::BAD_GATEWAY,
            ApiError::NotFound { .. } | ApiError::InvalidId { .. } | ApiError::RouteNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidCommand(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Hardware(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ReadTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Build the envelope for this error
    pub fn problem(&self) -> Problem {
        let (title, detail, errors) = match self {
            ApiError::NotConnected => (
                "Client Connection Failed".to_string(),
                "The hardware-control client is not connected".to_string(),
                Vec::new(),
            ),
            ApiError::NotFound { resource, id } => (
                format!("{} Not Found", resource.label()),
                format!("Invalid {} ID {}", resource.label(), id),
                Vec::new(),
            ),
            ApiError::InvalidId { resource, raw } => (
                format!("{} Not Found", resource.label()),
                format!("Invalid {} ID '{}'", resource.label(), raw),
                Vec::new(),
            ),
            ApiError::RouteNotFound(path) => (
                "Not Found".to_string(),
                format!("No resource at {}", path),
                Vec::new(),
            ),
            ApiError::MethodNotAllowed => (
                "Method Not Allowed".to_string(),
                "Method not supported by this resource".to_string(),
                Vec::new(),
            ),
            ApiError::InvalidCommand(errors) => (
                "Invalid Command".to_string(),
                format!("{} field(s) failed validation", errors.len()),
                errors.clone(),
            ),
            ApiError::Hardware(message) => (
                "Hardware Command Failed".to_string(),
                message.clone(),
                Vec::new(),
            ),
            ApiError::ReadTimeout(timeout) => (
                "Sensor Read Timeout".to_string(),
                format!("Sensor did not respond within {} ms", timeout.as_millis()),
                Vec::new(),
            ),
            ApiError::Internal(message) => (
                "Internal Server Error".to_string(),
                message.clone(),
                Vec::new(),
            ),
        };

        Problem {
            title,
            status: self.status().as_u16(),
            detail,
            errors,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let problem = self.problem();
        write!(f, "{}: {}", problem.title, problem.detail)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let problem = self.problem();

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), title = %problem.title, detail = %problem.detail, "API error");
        } else {
            tracing::debug!(status = status.as_u16(), title = %problem.title, detail = %problem.detail, "API client error");
        }

        match serde_json::to_vec(&problem) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
                body,
            )
                .into_response(),
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotConnected | ClientError::ConnectionFailed(_) => ApiError::NotConnected,
            ClientError::DeviceNotFound(id) => ApiError::NotFound {
                resource: Resource::Device,
                id,
            },
            ClientError::Device(message) => ApiError::Hardware(message),
            ClientError::Protocol(_) | ClientError::Timeout => ApiError::Hardware(err.to_string()),
        }
    }
}
