//! Application configuration
//!
//! Everything is read from environment variables (after `.env`). Only the
//! database URL and the token secret are required.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub gateway: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub realtime: RealtimeConfig,
    pub telemetry: TelemetryConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Server configuration (for both API and Gateway)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Realtime gateway tuning
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Seconds a new connection has to identify before it is dropped
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    /// Outbound frames buffered per connection
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    #[serde(default = "default_subscriber_reconnect_delay")]
    pub subscriber_reconnect_delay_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            auth_timeout_secs: default_auth_timeout(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            outbound_buffer: default_outbound_buffer(),
            subscriber_reconnect_delay_ms: default_subscriber_reconnect_delay(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_GATEWAY_PORT: u16 = 8081;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

fn default_app_name() -> String {
    "alumni-chat".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_redis_max_connections() -> u32 {
    16
}

fn default_access_token_expiry() -> i64 {
    3600
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_burst() -> u32 {
    60
}

fn default_auth_timeout() -> u64 {
    10
}

fn default_heartbeat_interval() -> u64 {
    41_250
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_subscriber_reconnect_delay() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Typed reads over a key lookup; unparseable values are errors, not defaults
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.string(key).ok_or(ConfigError::MissingVar(key))
    }

    fn parsed<T: std::str::FromStr>(&self, key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
        match self.string(key) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue(key, raw)),
            None => Ok(default()),
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.string(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn environment(&self) -> Result<Environment, ConfigError> {
        match self.string("APP_ENV").map(|s| s.to_lowercase()).as_deref() {
            None => Ok(default_env()),
            Some("development" | "dev") => Ok(Environment::Development),
            Some("staging") => Ok(Environment::Staging),
            Some("production" | "prod") => Ok(Environment::Production),
            Some(other) => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment, after `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        let config = Self {
            app: AppSettings {
                name: vars.string("APP_NAME").unwrap_or_else(default_app_name),
                env: vars.environment()?,
            },
            api: ServerConfig {
                host: vars.string("API_HOST").unwrap_or_else(default_host),
                port: vars.parsed("API_PORT", || DEFAULT_API_PORT)?,
            },
            gateway: ServerConfig {
                host: vars.string("GATEWAY_HOST").unwrap_or_else(default_host),
                port: vars.parsed("GATEWAY_PORT", || DEFAULT_GATEWAY_PORT)?,
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars.parsed("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: vars.parsed("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
                acquire_timeout_secs: vars.parsed("DATABASE_ACQUIRE_TIMEOUT", default_acquire_timeout)?,
            },
            redis: RedisConfig {
                url: vars.string("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
                max_connections: vars.parsed("REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
            },
            jwt: JwtConfig {
                secret: vars.required("JWT_SECRET")?,
                access_token_expiry: vars.parsed("JWT_ACCESS_TOKEN_EXPIRY", default_access_token_expiry)?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: vars.parsed("RATE_LIMIT_REQUESTS_PER_SECOND", default_requests_per_second)?,
                burst: vars.parsed("RATE_LIMIT_BURST", default_burst)?,
            },
            cors: CorsConfig {
                allowed_origins: vars.list("CORS_ALLOWED_ORIGINS"),
            },
            realtime: RealtimeConfig {
                auth_timeout_secs: vars.parsed("GATEWAY_AUTH_TIMEOUT", default_auth_timeout)?,
                heartbeat_interval_ms: vars.parsed("GATEWAY_HEARTBEAT_INTERVAL_MS", default_heartbeat_interval)?,
                outbound_buffer: vars.parsed("GATEWAY_OUTBOUND_BUFFER", default_outbound_buffer)?,
                subscriber_reconnect_delay_ms: vars
                    .parsed("REDIS_SUBSCRIBER_RECONNECT_DELAY_MS", default_subscriber_reconnect_delay)?,
            },
            telemetry: TelemetryConfig {
                log_level: vars.string("LOG_LEVEL").unwrap_or_else(default_log_level),
                json: vars.parsed("LOG_JSON", || false)?,
            },
        };
        config.check()?;
        Ok(config)
    }

    /// Cross-field rules
    fn check(&self) -> Result<(), ConfigError> {
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MIN_CONNECTIONS",
                format!("{} exceeds the maximum of {}", self.database.min_connections, self.database.max_connections),
            ));
        }
        if self.app.env.is_production() && self.jwt.secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET",
                "must be at least 32 bytes in production".to_string(),
            ));
        }
        if self.realtime.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("GATEWAY_HEARTBEAT_INTERVAL_MS", "0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
