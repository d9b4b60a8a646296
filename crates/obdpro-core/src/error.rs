//! Common error types for bridge and assistant collaborators

use thiserror::Error;

/// Result type for collaborator calls
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur when talking to the hardware bridge or the
/// assistant backend
#[derive(Debug, Error, Clone)]
pub enum BridgeError {
    /// Network-level failure (connection refused, reset, DNS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote answered with a non-success status
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// The remote answered but the body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Timeout waiting for a response
    #[error("Request timed out")]
    Timeout,

    /// The collaborator is not configured (e.g. no assistant endpoint)
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl BridgeError {
    /// Create a status error from code and message
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Whether this failure means the link itself is down, as opposed to a
    /// well-formed but unusable answer
    pub fn is_link_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::Transport(_) | BridgeError::Timeout | BridgeError::Status { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_failure_classification() {
        assert!(BridgeError::Transport("refused".into()).is_link_failure());
        assert!(BridgeError::status(503, "busy").is_link_failure());
        assert!(BridgeError::Timeout.is_link_failure());
        assert!(!BridgeError::Parse("bad json".into()).is_link_failure());
    }

    #[test]
    fn test_status_display() {
        let err = BridgeError::status(404, "not found");
        assert_eq!(err.to_string(), "HTTP status 404: not found");
    }
}
