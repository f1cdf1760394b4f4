//! Application configuration loaded from environment variables.
//!
//! The backend URL and anon key identify the hosted backend project;
//! account credentials are optional and only needed for the padel and
//! settings flows.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (REST + auth APIs).
    pub backend_url: String,
    /// Public anon API key sent with every request.
    pub anon_key: String,
    /// Optional account credentials for the authenticated flows.
    pub email: Option<String>,
    pub password: Option<String>,
    /// Deadline for snapshot fetches, in seconds.
    pub fetch_timeout_secs: u64,
    /// Change-poll interval for the live subscription, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            anon_key: "test_anon_key".to_string(),
            email: None,
            password: None,
            fetch_timeout_secs: 8,
            poll_interval_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            backend_url: env::var("SPORTDESK_BACKEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SPORTDESK_BACKEND_URL"))?,
            anon_key: env::var("SPORTDESK_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SPORTDESK_ANON_KEY"))?,
            email: env::var("SPORTDESK_EMAIL").ok(),
            password: env::var("SPORTDESK_PASSWORD").ok(),
            fetch_timeout_secs: env::var("SPORTDESK_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            poll_interval_secs: env::var("SPORTDESK_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
