//! State assembly and the serve loop

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use chat_cache::{Publisher, RedisPool};
use chat_common::{AppConfig, AppError, JwtService};
use chat_service::ServiceContext;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::{apply_middleware, apply_middleware_with_config};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Routes with request id, tracing and timeout layers
pub fn create_app(state: AppState) -> Router {
    apply_middleware(create_router())
        .merge(health_routes())
        .with_state(state)
}

/// Routes with the full configured stack; health checks skip the rate limit
pub fn create_app_with_config(state: AppState, config: &AppConfig) -> Result<Router, AppError> {
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    )?;

    Ok(api.merge(health_routes()).with_state(state))
}

/// Connect to PostgreSQL and Redis and build `AppState`
///
/// Persisted events are published to Redis so gateway instances can relay
/// them to their rooms.
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = chat_db::create_pool(&chat_db::DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let redis_pool = RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
    let origin = format!("api-{}", uuid::Uuid::new_v4());
    let publisher = Publisher::new(redis_pool.clone()).with_origin(origin);

    let jwt_service = Arc::new(JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry));

    let service_context = ServiceContext::builder()
        .postgres(pool)
        .redis_pool(redis_pool)
        .publisher(Arc::new(publisher))
        .jwt_service(jwt_service)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context))
}

/// Bind and serve until Ctrl+C; in-flight requests finish first
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API address: {e}")))?;

    let app = create_app_with_config(create_app_state(&config).await?, &config)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;
    info!(%addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested, draining requests");
            } else {
                std::future::pending::<()>().await;
            }
        })
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}
