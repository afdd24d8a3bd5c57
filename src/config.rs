//! Process configuration read from the environment (and `.env` when present).

use crate::error::{InsightError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_AUDIT_USER: &str = "anonymous";

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    /// JSON-lines audit file; `None` writes audit records to the database.
    pub audit_log_path: Option<PathBuf>,
    pub audit_user: String,
    pub filter_catalog_path: Option<PathBuf>,
    pub bind_addr: String,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            InsightError::Config("OPENAI_API_KEY environment variable is not set".to_string())
        })?;
        let database_url = get("DATABASE_URL").ok_or_else(|| {
            InsightError::Config("DATABASE_URL environment variable is not set".to_string())
        })?;

        Ok(Self {
            llm: LlmConfig {
                api_key,
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 10)?),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?,
                connect_attempts: parse_or("DB_CONNECT_RETRIES", get("DB_CONNECT_RETRIES"), 3)?,
            },
            audit_log_path: get("AUDIT_LOG_PATH").map(PathBuf::from),
            audit_user: get("AUDIT_USER").unwrap_or_else(|| DEFAULT_AUDIT_USER.to_string()),
            filter_catalog_path: get("FILTER_CATALOG_PATH").map(PathBuf::from),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            InsightError::Config(format!("{} has an invalid value: '{}'", key, value))
        }),
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
