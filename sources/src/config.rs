//! Upstream source configuration.

use std::time::Duration;

use countrycache_common::time::constants;

/// Default country directory endpoint.
pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";

/// Default exchange-rate endpoint (USD based).
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Configuration for the upstream HTTP clients.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Country directory URL.
    pub countries_url: String,
    /// Exchange-rate feed URL.
    pub rates_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// User agent sent upstream.
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            request_timeout: constants::source_request_timeout(),
            user_agent: concat!("countrycache/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SourceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("COUNTRIES_API_URL") {
            config.countries_url = url;
        }

        if let Ok(url) = std::env::var("RATES_API_URL") {
            config.rates_url = url;
        }

        if let Ok(secs) = std::env::var("SOURCE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (label, url) in [("countries", &self.countries_url), ("rates", &self.rates_url)] {
            if url.is_empty() {
                return Err(format!("The {} URL cannot be empty", label));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("The {} URL must be http(s): {}", label, url));
            }
        }

        if self.request_timeout.is_zero() {
            return Err("Source request timeout cannot be zero".to_string());
        }

        Ok(())
    }
}
