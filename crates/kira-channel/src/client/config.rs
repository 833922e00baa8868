use std::time::Duration;

use secrecy::SecretString;

use crate::client::consts::{DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MS};

#[derive(Clone)]
pub struct Config {
    base_url: String,
    api_token: Option<SecretString>,
    reconnect_attempts: usize,
    reconnect_delay: Duration,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn with_api_token(mut self, api_token: &str) -> Self {
        self.config.api_token = Some(SecretString::from(api_token.to_string()));
        self
    }

    pub fn with_reconnect_attempts(mut self, attempts: usize) -> Self {
        self.config.reconnect_attempts = attempts;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    // Sets the default values.
    pub fn new() -> Self {
        Self {
            base_url: "ws://localhost:5000/realtime".to_string(),
            api_token: std::env::var("KIRA_API_TOKEN").ok().map(SecretString::from),
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_token(&self) -> Option<&SecretString> {
        self.api_token.as_ref()
    }

    pub fn reconnect_attempts(&self) -> usize {
        self.reconnect_attempts
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
