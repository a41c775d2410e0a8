//! Common error types for device clients

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the hardware-control backend
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// The client has no live connection to the backend
    #[error("Client not connected")]
    NotConnected,

    /// Establishing the connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Device index no longer present (e.g. removed by a re-scan)
    #[error("Device not found: {0}")]
    DeviceNotFound(u32),

    /// The device rejected or failed a command or read
    #[error("Device error: {0}")]
    Device(String),

    /// Unexpected message or malformed payload from the backend
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Backend did not answer within the client's own request timeout
    #[error("Operation timed out")]
    Timeout,
}

impl ClientError {
    /// Whether the error means the backend is unreachable rather than
    /// a single operation failing
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::NotConnected | ClientError::ConnectionFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_classified() {
        assert!(ClientError::NotConnected.is_connection_error());
        assert!(ClientError::ConnectionFailed("refused".into()).is_connection_error());
        assert!(!ClientError::Device("stalled".into()).is_connection_error());
        assert!(!ClientError::Timeout.is_connection_error());
    }

    #[test]
    fn device_error_message_is_preserved() {
        let err = ClientError::Device("motor stalled".into());
        assert_eq!(err.to_string(), "Device error: motor stalled");
    }
}
