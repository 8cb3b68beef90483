//! Errors that end a connection

use crate::protocol::CloseCode;
use chat_core::DomainError;
use thiserror::Error;

/// Errors that end the connection
///
/// Recoverable failures (a refused join, a rejected message) are replied to
/// on the socket and never become a `HandlerError`.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),

    /// Outbound buffer closed; the socket is going away
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HandlerError {
    /// Close code sent to the client
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::AuthenticationFailed(_) => CloseCode::AuthenticationFailed,
            Self::NotAuthenticated => CloseCode::NotAuthenticated,
            Self::DomainError(_) | Self::ConnectionClosed | Self::Encode(_) => CloseCode::UnknownError,
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for HandlerError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::ConnectionClosed
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
