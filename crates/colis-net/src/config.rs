//! Transport configuration loaded from environment variables.
//!
//! All settings have defaults so the client works with zero configuration
//! against the production endpoint.

use std::time::Duration;

use colis_shared::constants::HTTP_TIMEOUT_SECS;

/// Delivery API endpoint configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the delivery service, without a trailing slash.
    /// Env: `COLIS_API_URL`
    /// Default: `https://deliveries.devi7.in`
    pub base_url: String,

    /// Connect timeout for every request.
    /// Env: `COLIS_HTTP_TIMEOUT_SECS`
    /// Default: 15 s
    pub connect_timeout: Duration,

    /// Total per-request timeout (connect + read).
    /// Env: `COLIS_HTTP_TIMEOUT_SECS`
    /// Default: 15 s
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://deliveries.devi7.in".to_string(),
            connect_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("COLIS_API_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(secs) = std::env::var("COLIS_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.connect_timeout = Duration::from_secs(secs);
            config.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Override the base URL (used by tests and the CLI `--url` flag).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}
