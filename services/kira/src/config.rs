//! Application Configuration Module
//!
//! Centralizes configuration for the Kira voice service. Settings load from
//! environment variables (via `.env` in development) and CLI flags override
//! the relevant ones in `main`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

/// Holds all configuration loaded from the environment.
///
/// *   `KIRA_BACKEND_URL`: Realtime endpoint of the assistant backend.
/// *   `KIRA_LANGUAGE`: (Optional) Spoken language tag. Defaults to "en".
/// *   `KIRA_TAG`: (Optional) Restrict retrieval to one document category.
/// *   `KIRA_RECONNECT_ATTEMPTS` / `KIRA_RECONNECT_DELAY_MS`: Channel retry policy.
/// *   `KIRA_INTERRUPT_COOLDOWN_MS`: (Optional) Interruption cooldown tuning.
/// *   `RUST_LOG`: (Optional) Logging level. Defaults to "INFO".
///
/// `KIRA_API_TOKEN` is read by the channel layer itself when building the
/// connection request.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub language: String,
    pub tag: Option<String>,
    pub log_level: Level,
    pub reconnect_attempts: usize,
    pub reconnect_delay: Duration,
    pub interrupt_cooldown: Duration,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Useful for local development, ignored if absent.
        dotenvy::dotenv().ok();

        let backend_url = env::var("KIRA_BACKEND_URL")
            .unwrap_or_else(|_| "ws://localhost:5000/realtime".to_string());
        let language = env::var("KIRA_LANGUAGE").unwrap_or_else(|_| "en".to_string());
        let tag = env::var("KIRA_TAG").ok().filter(|t| !t.is_empty());

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            backend_url,
            language,
            tag,
            log_level,
            reconnect_attempts: parse_var("KIRA_RECONNECT_ATTEMPTS", 5)?,
            reconnect_delay: Duration::from_millis(parse_var("KIRA_RECONNECT_DELAY_MS", 2_000)?),
            interrupt_cooldown: Duration::from_millis(parse_var(
                "KIRA_INTERRUPT_COOLDOWN_MS",
                200,
            )?),
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidVar(name, raw.clone())),
        Err(_) => Ok(default),
    }
}
