//! Error types for bridge and assistant HTTP calls

use obdpro_core::BridgeError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Remote returned an error response
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Remote reported a timeout
    #[error("Request timed out")]
    Timeout,
}

impl ClientError {
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }
}

impl From<ClientError> for BridgeError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::HttpError(e) if e.is_timeout() => BridgeError::Timeout,
            ClientError::HttpError(e) if e.is_decode() => BridgeError::Parse(e.to_string()),
            ClientError::HttpError(e) => BridgeError::Transport(e.to_string()),
            ClientError::InvalidUrl(e) => BridgeError::NotConfigured(e.to_string()),
            ClientError::IoError(e) => BridgeError::Transport(e.to_string()),
            ClientError::ServerError { status, message } => BridgeError::status(status, message),
            ClientError::ParseError(msg) => BridgeError::Parse(msg),
            ClientError::Timeout => BridgeError::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_maps_to_status() {
        let err: BridgeError = ClientError::server_error(503, "busy").into();
        assert!(matches!(err, BridgeError::Status { status: 503, .. }));
        assert!(err.is_link_failure());
    }

    #[test]
    fn test_parse_error_is_not_link_failure() {
        let err: BridgeError = ClientError::ParseError("bad json".to_string()).into();
        assert!(!err.is_link_failure());
    }
}
