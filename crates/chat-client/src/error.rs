//! Client error types

use chat_gateway::protocol::CloseCode;
use thiserror::Error;

/// Errors surfaced by the delivery client
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The gateway closed the socket with a code that rules out retrying
    #[error("Closed by gateway: {}", .0.description())]
    Rejected(CloseCode),

    #[error("Handshake timed out")]
    HandshakeTimeout,

    /// The client task has shut down
    #[error("Client is closed")]
    Closed,
}

impl ClientError {
    /// Map a close frame to an error
    #[must_use]
    pub fn from_close(code: Option<u16>) -> Self {
        match code.and_then(CloseCode::from_u16) {
            Some(code) if !code.should_reconnect() => Self::Rejected(code),
            Some(code) => Self::Transport(format!("closed with {code}")),
            None => Self::Transport(match code {
                Some(code) => format!("closed with {code}"),
                None => "connection closed".to_string(),
            }),
        }
    }

    /// Whether retrying with the same credentials can succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected(_) | Self::Closed)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_is_final() {
        let err = ClientError::from_close(Some(4004));
        assert!(matches!(err, ClientError::Rejected(CloseCode::AuthenticationFailed)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeouts_and_plain_closes_retry() {
        assert!(ClientError::from_close(Some(4009)).is_retryable());
        assert!(ClientError::from_close(Some(1006)).is_retryable());
        assert!(ClientError::from_close(None).is_retryable());
    }
}
