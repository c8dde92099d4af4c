// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// API root, without a trailing slash
    pub base_url: String,
    /// Application identifier issued with the contract
    pub app_id: String,
    /// Contract identifier the session is scoped to
    pub contract_id: String,
    /// Session key from an external authorization step (optional)
    pub session_key: Option<String>,
    /// Per-request transport timeout
    pub request_timeout: Duration,
    /// Maximum number of item downloads / aggregations in flight
    pub max_concurrent_items: usize,
    /// Retry attempts wrapped around aggregation operations
    pub max_retries: u32,
    /// Delay between file list polls while a sync is running
    pub file_list_poll_interval: Duration,
    /// Polls before giving up on a sync that never settles
    pub max_file_list_polls: u32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            app_id: "test_app_id".to_string(),
            contract_id: "test_contract_id".to_string(),
            session_key: None,
            request_timeout: Duration::from_secs(30),
            max_concurrent_items: 4,
            max_retries: 3,
            file_list_poll_interval: Duration::from_millis(10),
            max_file_list_polls: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            base_url: env::var("PULL_BASE_URL")
                .unwrap_or_else(|_| "https://api.digi.me/v1.7".to_string())
                .trim_end_matches('/')
                .to_string(),
            app_id: env::var("PULL_APP_ID").map_err(|_| ConfigError::Missing("PULL_APP_ID"))?,
            contract_id: env::var("PULL_CONTRACT_ID")
                .map_err(|_| ConfigError::Missing("PULL_CONTRACT_ID"))?,
            session_key: env::var("PULL_SESSION_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            request_timeout: Duration::from_secs(parse_or("PULL_REQUEST_TIMEOUT_SECS", 30)?),
            max_concurrent_items: parse_or("PULL_MAX_CONCURRENT_ITEMS", 4)?,
            max_retries: parse_or("PULL_MAX_RETRIES", 3)?,
            file_list_poll_interval: Duration::from_millis(parse_or(
                "PULL_FILE_LIST_POLL_MS",
                3000,
            )?),
            max_file_list_polls: parse_or("PULL_MAX_FILE_LIST_POLLS", 20)?,
        })
    }
}

/// Read an optional numeric variable, rejecting values that do not parse.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
