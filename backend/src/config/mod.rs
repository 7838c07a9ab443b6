//! Application configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => bail!("Invalid LOG_FORMAT {:?} (expected json or pretty)", other),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL
    /// Uses DATABASE_URL, falling back to DATABASE_PATH
    pub database_url: String,

    /// Maximum pooled connections
    pub database_max_connections: u32,

    /// How long to keep retrying the initial connection
    pub database_connect_timeout: Duration,

    /// Prefix turning stored asset paths into download URLs
    pub asset_url_prefix: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .or_else(|_| env::var("DATABASE_PATH").map(|path| format!("sqlite:{}", path)))
            .unwrap_or_else(|_| "sqlite:spx.db".to_string());

        Ok(Self {
            database_url,

            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,

            database_connect_timeout: Duration::from_secs(
                env::var("DATABASE_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid DATABASE_CONNECT_TIMEOUT_SECS")?,
            ),

            asset_url_prefix: env::var("ASSET_URL_PREFIX")
                .or_else(|_| env::var("QINIU_PATH"))
                .unwrap_or_default(),

            log_format: LogFormat::parse(
                &env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            )?,
        })
    }
}
