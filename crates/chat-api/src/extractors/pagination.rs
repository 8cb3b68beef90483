//! `?before=<message id>&limit=<n>` on message history
//!
//! Out-of-range limits are clamped rather than refused; a cursor that is
//! not a message id is a 400.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use chat_core::MessageId;
use chat_service::dto::ListMessagesQuery;
use serde::Deserialize;

use crate::response::ApiError;

const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
struct RawPage {
    before: Option<String>,
    limit: Option<i64>,
}

/// History page request, ready for the message service
#[derive(Debug, Clone, Default)]
pub struct Pagination(pub ListMessagesQuery);

impl Pagination {
    fn parse(raw: RawPage) -> Result<Self, ApiError> {
        let before = match raw.before.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(cursor) => Some(
                cursor
                    .parse::<MessageId>()
                    .map_err(|_| ApiError::invalid_query("'before' must be a message id"))?,
            ),
        };
        Ok(Self(ListMessagesQuery {
            before,
            limit: raw.limit.map(|n| n.clamp(1, MAX_LIMIT)),
        }))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPage>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.body_text()))?;
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_params_leave_defaults_to_the_service() {
        let Pagination(query) = Pagination::parse(RawPage::default()).unwrap();
        assert!(query.before.is_none());
        assert!(query.limit.is_none());
    }

    #[test]
    fn test_limit_is_clamped() {
        let page = |limit| Pagination::parse(RawPage { before: None, limit: Some(limit) }).unwrap().0.limit;
        assert_eq!(page(500), Some(MAX_LIMIT));
        assert_eq!(page(0), Some(1));
        assert_eq!(page(25), Some(25));
    }

    #[test]
    fn test_cursor() {
        let id = MessageId::new();
        let Pagination(query) = Pagination::parse(RawPage {
            before: Some(id.to_string()),
            limit: None,
        })
        .unwrap();
        assert_eq!(query.before, Some(id));

        let err = Pagination::parse(RawPage {
            before: Some("123456789".to_string()),
            limit: None,
        })
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_QUERY_PARAMETER");
    }
}
