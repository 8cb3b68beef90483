//! # chat-common
//!
//! Configuration, the application error type, bearer-token verification and
//! tracing setup shared by the API, the gateway and the service layer.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{Claims, JwtService, TokenType};
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, JwtConfig,
    RateLimitConfig, RealtimeConfig, RedisConfig, ServerConfig, TelemetryConfig,
};
pub use error::{AppError, ErrorClass};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, LogFormat, TracingConfig, TracingError};
