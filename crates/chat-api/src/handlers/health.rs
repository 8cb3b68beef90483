//! Liveness and readiness checks

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub checks: BackendChecks,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendChecks {
    pub database: &'static str,
    pub redis: &'static str,
}

impl ReadinessResponse {
    fn from_checks(database: bool, redis: bool) -> Self {
        let label = |healthy: bool| if healthy { "healthy" } else { "unhealthy" };
        Self {
            status: if database && redis { "ready" } else { "not_ready" },
            timestamp: Utc::now(),
            checks: BackendChecks {
                database: label(database),
                redis: label(redis),
            },
        }
    }

    fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

/// GET /health/ready
///
/// A backing service that is not configured counts as healthy.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let ctx = state.service_context();

    let database = match ctx.pool() {
        Some(pool) => chat_db::ping(pool).await.is_ok(),
        None => true,
    };
    let redis = match ctx.redis_pool() {
        Some(redis) => redis.health_check().await.is_ok(),
        None => true,
    };

    let response = ReadinessResponse::from_checks(database, redis);
    if !response.is_ready() {
        tracing::warn!(database, redis, "Readiness check failed");
    }
    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
