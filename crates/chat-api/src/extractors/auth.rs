//! Bearer-token caller identity

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chat_common::AppError;
use chat_core::UserId;

use crate::response::ApiError;
use crate::state::AppState;

/// The verified caller
///
/// Missing, malformed, forged and expired tokens are all rejected with
/// `AUTHENTICATION_FAILED`; the reason is only logged.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(TypedHeader(Authorization(bearer))) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
        else {
            return Err(AppError::MissingAuth.into());
        };

        let state = AppState::from_ref(state);
        match state.service_context().jwt_service().authenticate(bearer.token()) {
            Ok(user_id) => Ok(Self { user_id }),
            Err(reason) => {
                tracing::warn!(reason = %reason, path = %parts.uri.path(), "Bearer token refused");
                Err(AppError::InvalidToken.into())
            }
        }
    }
}
