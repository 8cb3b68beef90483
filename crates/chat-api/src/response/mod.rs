//! Error envelope and status-only responses
//!
//! Every failure renders as `{"error": {"code", "message", "details"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_common::{AppError, ErrorClass};
use chat_core::DomainError;
use chat_service::ServiceError;
use serde::Serialize;
use serde_json::Value;
use validator::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Malformed path, query or body, before any handler runs
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::App(err.into())
    }
}

impl ApiError {
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::bad_request("INVALID_PATH_PARAMETER", message)
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::bad_request("INVALID_QUERY_PARAMETER", message)
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::bad_request("INVALID_BODY", message)
    }

    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::App(e) => e.class(),
            Self::Service(e) => e.class(),
            Self::Validation(_) | Self::BadRequest { .. } => ErrorClass::Invalid,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.class().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::App(e) => e.error_code(),
            Self::Service(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest { code, .. } => code,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if self.class() == ErrorClass::Internal {
            tracing::error!(error = ?self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let details = match &self {
            Self::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };

        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// 201 around any response
pub struct Created<T>(pub T);

impl<T: IntoResponse> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, self.0).into_response()
    }
}

pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chat_core::ConversationId;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_auth_errors_share_a_code() {
        for err in [ApiError::from(AppError::MissingAuth), ApiError::from(AppError::InvalidToken)] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.error_code(), "AUTHENTICATION_FAILED");
        }
    }

    #[test]
    fn test_domain_not_found_maps_to_404() {
        let err = ApiError::from(DomainError::ConversationNotFound(ConversationId::new()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bad_path_envelope() {
        let (status, body) = body_of(ApiError::invalid_path("Invalid conversation_id format")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PATH_PARAMETER");
        assert_eq!(body["error"]["message"], "Invalid conversation_id format");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_rendered() {
        let err = ApiError::from(ServiceError::internal("duplicate conversation vanished"));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "Internal server error");
    }
}
