//! Errors returned by the conversation and message services

use chat_common::{AppError, ErrorClass};
use chat_core::DomainError;
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    App(#[from] AppError),

    /// Missing, or hidden from a caller who is not a member
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Domain(e) => ErrorClass::of_domain(e),
            Self::App(e) => e.class(),
            Self::NotFound { .. } => ErrorClass::Missing,
            Self::Validation(_) => ErrorClass::Invalid,
            Self::Internal(_) => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.class().status()
    }

    /// Stable reason code for callers
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for the not-found family, whatever layer raised it
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::Missing
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
