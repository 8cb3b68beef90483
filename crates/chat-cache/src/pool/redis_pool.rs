//! Pooled Redis connections for publishing and readiness checks.
//!
//! Room subscriptions do not use this pool; `RoomSubscriber` owns a
//! dedicated Pub/Sub connection.

use deadpool_redis::{Config, Pool, Runtime};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    pub url: String,
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
        }
    }
}

impl From<&chat_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &chat_common::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections as usize,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Invalid Redis configuration: {0}")]
    Config(String),

    #[error("No Redis connection available: {0}")]
    Unavailable(#[from] deadpool_redis::PoolError),

    #[error("Redis command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type RedisResult<T> = Result<T, RedisPoolError>;

#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
    /// Host part of the URL, for logs
    host: String,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisPool")
            .field("host", &self.host)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl RedisPool {
    /// Build the pool; no connection is opened until first use
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::Config(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::Config(e.to_string()))?;

        let host = host_of(&config.url).to_string();
        tracing::info!(host = %host, max_connections = config.max_connections, "Redis pool ready");

        Ok(Self { pool, host })
    }

    pub fn from_config(config: &chat_common::RedisConfig) -> RedisResult<Self> {
        Self::new(RedisPoolConfig::from(config))
    }

    pub async fn get(&self) -> RedisResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// Round-trip time of a PING
    pub async fn ping(&self) -> RedisResult<Duration> {
        let started = Instant::now();
        let mut conn = self.get().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(started.elapsed())
    }

    pub async fn health_check(&self) -> RedisResult<()> {
        let rtt = self.ping().await?;
        tracing::trace!(host = %self.host, rtt_ms = rtt.as_millis() as u64, "Redis ping");
        Ok(())
    }
}

/// Host part of a Redis URL, without scheme or credentials
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.rsplit('@').next().unwrap_or(rest)
}
