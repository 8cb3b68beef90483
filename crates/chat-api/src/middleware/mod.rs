//! Layer stacks for the REST router
//!
//! Every route gets a request id, a trace span and a timeout. The configured
//! stack adds CORS and a process-wide rate limit.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    Router,
};
use chat_common::{AppError, CorsConfig, RateLimitConfig};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Request id, trace span and timeout
pub fn apply_middleware(router: Router<AppState>) -> Router<AppState> {
    // The last layer added runs first, so the id exists before the span reads it
    router
        .layer(TimeoutLayer::with_status_code(StatusCode::SERVICE_UNAVAILABLE, REQUEST_TIMEOUT))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
}

/// [`apply_middleware`] plus CORS, all behind the rate limiter
pub fn apply_middleware_with_config(
    router: Router<AppState>,
    rate_limit: &RateLimitConfig,
    cors: &CorsConfig,
    is_production: bool,
) -> Result<Router<AppState>, AppError> {
    let governor = GovernorConfigBuilder::default()
        .per_second(rate_limit.requests_per_second.into())
        .burst_size(rate_limit.burst)
        .key_extractor(GlobalKeyExtractor)
        .finish()
        .ok_or_else(|| AppError::Config("Rate limit must allow at least one request".to_string()))?;

    let router = apply_middleware(router.layer(cors_layer(cors, is_production)));
    Ok(router.layer(GovernorLayer {
        config: Arc::new(governor),
    }))
}

fn cors_layer(config: &CorsConfig, is_production: bool) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT, REQUEST_ID])
        .expose_headers([REQUEST_ID]);

    match (config.allowed_origins.is_empty(), is_production) {
        (true, false) => {
            tracing::warn!("CORS open to any origin outside production");
            layer.allow_origin(Any)
        }
        (empty, _) => {
            if empty {
                tracing::warn!("No CORS origins configured; browsers will be refused");
            }
            let origins: Vec<HeaderValue> = config
                .allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Skipping malformed CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tower::ServiceExt;

    fn router() -> Router<AppState> {
        Router::new().route("/ping", get(|| async { "pong" }))
    }

    #[tokio::test]
    async fn test_request_id_is_generated_and_echoed() {
        let app = apply_middleware(router()).with_state(test_state());
        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(&REQUEST_ID).unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_caller_request_id_is_kept() {
        let app = apply_middleware(router()).with_state(test_state());
        let request = Request::builder()
            .uri("/ping")
            .header(&REQUEST_ID, "trace-me")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers().get(&REQUEST_ID).unwrap(), "trace-me");
    }

    #[test]
    fn test_zero_rate_is_a_config_error() {
        let limits = RateLimitConfig {
            requests_per_second: 0,
            burst: 0,
        };
        let err = apply_middleware_with_config(router(), &limits, &CorsConfig::default(), false).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    fn test_state() -> AppState {
        AppState::new(chat_service::testing::test_context().ctx)
    }
}
