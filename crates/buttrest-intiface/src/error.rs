//! Intiface client errors

use buttrest_core::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntifaceError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error {code}: {message}")]
    Server { code: u32, message: String },

    #[error("Unexpected response to {request}: {response}")]
    UnexpectedResponse {
        request: &'static str,
        response: String,
    },

    #[error("Connection closed")]
    Closed,

    #[error("Not connected")]
    NotConnected,

    #[error("Request timed out")]
    Timeout,
}

impl From<IntifaceError> for ClientError {
    fn from(err: IntifaceError) -> Self {
        match err {
            IntifaceError::WebSocket(e) => ClientError::ConnectionFailed(e.to_string()),
            IntifaceError::Closed | IntifaceError::NotConnected => ClientError::NotConnected,
            IntifaceError::Server { message, .. } => ClientError::Device(message),
            IntifaceError::Json(_) | IntifaceError::UnexpectedResponse { .. } => {
                ClientError::Protocol(err.to_string())
            }
            IntifaceError::Timeout => ClientError::Timeout,
        }
    }
}
