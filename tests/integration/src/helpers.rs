//! Test helpers for integration tests
//!
//! Spawns the REST API and the gateway on loopback ports against the
//! PostgreSQL and Redis named by the environment, and wraps reqwest for
//! authenticated calls.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use chat_api::{create_app, create_app_state};
use chat_common::{AppConfig, JwtService};
use chat_core::UserId;
use chat_db::{default_migrations_dir, run_migrations, PgPool};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Configuration plus a migrated pool for seeding
pub struct TestEnv {
    pub config: AppConfig,
    pub pool: PgPool,
}

impl TestEnv {
    /// `None` when the environment does not name reachable backends
    pub async fn load() -> Option<Self> {
        if !check_test_env().await {
            return None;
        }
        let config = match test_config() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Skipping test: {e}");
                return None;
            }
        };
        let pool = match PgPool::connect(&config.database.url).await {
            Ok(pool) => pool,
            Err(e) => {
                eprintln!("Skipping test: database unreachable: {e}");
                return None;
            }
        };
        if let Err(e) = run_migrations(&pool, default_migrations_dir()).await {
            eprintln!("Skipping test: migrations failed: {e}");
            return None;
        }
        Some(Self { config, pool })
    }

    /// Bearer token for `user`, signed with the configured secret
    pub fn token_for(&self, user: UserId) -> String {
        JwtService::new(&self.config.jwt.secret, self.config.jwt.access_token_expiry)
            .issue_access_token(user)
            .unwrap_or_default()
    }

    /// Insert a posting with a reference no other run uses
    pub async fn seed_posting(&self, title: &str) -> Result<String> {
        let posting_ref = format!("P-{}", Uuid::new_v4());
        sqlx::query("INSERT INTO postings (id, title) VALUES ($1, $2)")
            .bind(&posting_ref)
            .bind(title)
            .execute(&self.pool)
            .await
            .context("seeding posting")?;
        Ok(posting_ref)
    }
}

/// REST API on a loopback port
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the API with `env`'s configuration
    pub async fn start(env: &TestEnv) -> Result<Self> {
        let state = create_app_state(&env.config).await?;
        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).bearer_auth(token).send().await?)
    }

    pub async fn post_auth<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).bearer_auth(token).json(body).send().await?)
    }

    /// POST with no body
    pub async fn post_empty_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).bearer_auth(token).send().await?)
    }

    pub async fn patch_auth<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.patch(&url).bearer_auth(token).json(body).send().await?)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.delete(&url).bearer_auth(token).send().await?)
    }
}

/// Gateway on a loopback port, relaying through Redis
pub struct TestGateway {
    pub addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    pub async fn start(env: &TestEnv) -> Result<Self> {
        let state = chat_gateway::create_gateway_state(&env.config).await?;
        let app = chat_gateway::create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            chat_gateway::server::serve(listener, app).await.ok();
        });

        Ok(Self { addr, _handle: handle })
    }

    pub fn url(&self) -> String {
        format!("ws://{}/gateway", self.addr)
    }
}

/// Configuration from the environment (and `.env` if present)
pub fn test_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))
}

/// Whether the backends these tests need are configured
pub async fn check_test_env() -> bool {
    dotenvy::dotenv().ok();

    for var in ["DATABASE_URL", "REDIS_URL", "JWT_SECRET"] {
        if std::env::var(var).is_err() {
            eprintln!("Skipping test: {var} not set");
            return false;
        }
    }

    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {}, got {}. Body: {}", expected_status, status, body);
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {}, got {}. Body: {}", expected_status, status, body);
    }
    Ok(())
}

/// Error code from the JSON error envelope
pub async fn error_code(response: Response) -> Result<String> {
    let body: serde_json::Value = response.json().await?;
    body["error"]["code"]
        .as_str()
        .map(str::to_string)
        .context("response has no error code")
}
