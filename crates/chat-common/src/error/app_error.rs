//! Application error type
//!
//! Carried across crate boundaries; every variant resolves to an HTTP
//! status and a stable reason code through its [`ErrorClass`].

use chat_core::{DomainError, DomainErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

/// Coarse outcome class shared by every error layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Unauthenticated,
    Forbidden,
    Invalid,
    Missing,
    Conflict,
    Internal,
}

impl ErrorClass {
    /// Class of a domain error
    #[must_use]
    pub fn of_domain(err: &DomainError) -> Self {
        match err.kind() {
            DomainErrorKind::NotFound => Self::Missing,
            DomainErrorKind::Authorization => Self::Forbidden,
            DomainErrorKind::Validation => Self::Invalid,
            DomainErrorKind::Conflict => Self::Conflict,
            DomainErrorKind::Infrastructure => Self::Internal,
        }
    }

    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            Self::Invalid => 400,
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::Missing => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }
}

impl AppError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingAuth | Self::InvalidToken | Self::TokenExpired => ErrorClass::Unauthenticated,
            Self::NotAuthorized => ErrorClass::Forbidden,
            Self::Validation(_) => ErrorClass::Invalid,
            Self::NotFound(_) => ErrorClass::Missing,
            Self::Domain(e) => ErrorClass::of_domain(e),
            Self::Database(_) | Self::Cache(_) | Self::Config(_) | Self::Internal(_) => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.class().status()
    }

    /// Stable reason code; infrastructure detail never leaks through it
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAuth | Self::InvalidToken => "AUTHENTICATION_FAILED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Domain(e) => e.code(),
            Self::Database(_) | Self::Cache(_) | Self::Config(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}
