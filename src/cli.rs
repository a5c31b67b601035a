//! Command-line and environment configuration
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file is loaded first by `main`). Values are read once at startup and
//! validated into an `AppConfig`.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

use crate::data::github::GITHUB_GRAPHQL_URL;

/// Error types for configuration validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The cache TTL must be at least one second
    #[error("Invalid cache TTL: must be greater than zero")]
    InvalidTtl,

    /// An allowed origin is not a valid header value, or is the `*` wildcard
    /// (credentialed CORS needs explicit origins)
    #[error("Invalid allowed origin: '{0}'")]
    InvalidOrigin(String),
}

/// Repofolio - serves your public GitHub repositories as a cached JSON API
#[derive(Parser, Debug)]
#[command(name = "repofolio")]
#[command(about = "Cached JSON facade over your public GitHub repositories")]
#[command(version)]
pub struct Cli {
    /// GitHub token used as the bearer credential for the GraphQL API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Origins allowed to make cross-origin requests (comma separated)
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// How long a fetched project list is served from cache, in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    /// Upstream request timeout, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    /// GitHub GraphQL endpoint
    #[arg(long, env = "GITHUB_GRAPHQL_URL", default_value = GITHUB_GRAPHQL_URL)]
    pub graphql_url: String,

    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Validated application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub github_token: Option<String>,
    pub allowed_origins: Vec<HeaderValue>,
    pub cache_ttl: chrono::Duration,
    pub upstream_timeout: Duration,
    pub graphql_url: String,
    pub bind: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            allowed_origins: vec![HeaderValue::from_static("http://localhost:3000")],
            cache_ttl: chrono::Duration::seconds(3600),
            upstream_timeout: Duration::from_secs(10),
            graphql_url: GITHUB_GRAPHQL_URL.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

impl Cli {
    /// Validates the parsed arguments into an AppConfig
    ///
    /// # Returns
    /// * `Ok(AppConfig)` with parsed origins and durations
    /// * `Err(ConfigError)` if the TTL is zero or an origin is not a valid header value
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let ttl_secs = i64::try_from(self.cache_ttl_secs).map_err(|_| ConfigError::InvalidTtl)?;
        if ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl);
        }
        let cache_ttl = chrono::Duration::try_seconds(ttl_secs).ok_or(ConfigError::InvalidTtl)?;

        let allowed_origins = self
            .allowed_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(|o| match o {
                "*" => Err(ConfigError::InvalidOrigin(o.to_string())),
                _ => HeaderValue::from_str(o).map_err(|_| ConfigError::InvalidOrigin(o.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let github_token = self.github_token.filter(|t| !t.trim().is_empty());

        Ok(AppConfig {
            github_token,
            allowed_origins,
            cache_ttl,
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
            graphql_url: self.graphql_url,
            bind: self.bind,
        })
    }
}
