//! Gateway server setup
//!
//! Wiring of the conversation services, the local room broadcaster and the
//! Redis relay, plus the WebSocket routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::broadcast::{RoomRelay, RoomBroadcaster};
use crate::connection::ConnectionManager;
use axum::{routing::get, Router};
use chat_cache::{Publisher, RedisPool, SubscriberConfig};
use chat_common::{AppConfig, AppError, JwtService, RealtimeConfig};
use chat_core::EventPublisher;
use chat_service::{FanoutPublisher, ServiceContext, ServiceContextBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assemble a gateway over `builder`'s store
///
/// Persisted events go to the local room broadcaster first, then to
/// `relay_sink` if given. The builder must already carry everything except
/// the publisher.
pub fn create_local_state(
    builder: ServiceContextBuilder,
    relay_sink: Option<Arc<dyn EventPublisher>>,
    realtime: RealtimeConfig,
    instance_id: impl Into<Arc<str>>,
) -> Result<(GatewayState, RoomBroadcaster), AppError> {
    let connection_manager = ConnectionManager::new_shared();
    let broadcaster = RoomBroadcaster::new(connection_manager.clone());

    let mut publisher = FanoutPublisher::new().with(Arc::new(broadcaster.clone()));
    if let Some(sink) = relay_sink {
        publisher = publisher.with(sink);
    }

    let service_context: ServiceContext = builder
        .publisher(Arc::new(publisher))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let state = GatewayState::new(service_context, connection_manager, realtime, instance_id);
    Ok((state, broadcaster))
}

/// Connect to PostgreSQL and Redis and create `GatewayState`
pub async fn create_gateway_state(config: &AppConfig) -> Result<GatewayState, AppError> {
    tracing::info!("Connecting to PostgreSQL...");
    let pool = chat_db::create_pool(&chat_db::DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    let redis_pool = RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;

    let instance_id = format!("gateway-{}", uuid::Uuid::new_v4());
    let redis_publisher = Publisher::new(redis_pool.clone()).with_origin(instance_id.clone());

    let jwt_service = Arc::new(JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry));

    let builder = ServiceContext::builder()
        .postgres(pool)
        .redis_pool(redis_pool)
        .jwt_service(jwt_service);

    let (state, broadcaster) = create_local_state(
        builder,
        Some(Arc::new(redis_publisher)),
        config.realtime.clone(),
        instance_id.clone(),
    )?;

    let relay = Arc::new(RoomRelay::new(
        SubscriberConfig::from_config(&config.redis, &config.realtime),
        instance_id.clone(),
        broadcaster.clone(),
    ));
    broadcaster.attach_relay(&relay);
    relay.clone().start();

    tracing::info!(instance_id = %instance_id, "Gateway state ready");

    Ok(state.with_relay(relay))
}

/// Serve `app` on an already bound listener until it fails
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

/// Bind, serve, and on Ctrl+C ask every client to reconnect elsewhere
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(&config).await?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!(%addr, "Gateway listening on ws://{addr}/gateway");

    let draining = state.clone();
    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let notified = draining.connection_manager().broadcast_reconnect();
            tracing::info!(connections = notified, "Shutting down, clients told to reconnect");
            if let Some(relay) = draining.relay() {
                relay.stop().await;
            }
        })
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
}
