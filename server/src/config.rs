//! Server configuration.

use std::net::SocketAddr;

use countrycache_engine::EngineConfig;
use countrycache_sources::SourceConfig;

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub port: u16,
    /// SQLite database URL.
    pub database_url: String,
    /// Run one refresh before serving requests.
    pub refresh_on_startup: bool,
    /// Emit logs as JSON lines.
    pub log_json: bool,
    /// Upstream source configuration.
    pub sources: SourceConfig,
    /// Refresh engine configuration.
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 5000,
            database_url: "sqlite:///tmp/countries.db".to_string(),
            refresh_on_startup: false,
            log_json: false,
            sources: SourceConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            sources: SourceConfig::from_env(),
            engine: EngineConfig::from_env(),
            ..Self::default()
        };

        if let Ok(addr) = std::env::var("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(flag) = std::env::var("REFRESH_ON_STARTUP") {
            config.refresh_on_startup = parse_flag(&flag);
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.log_json = format.eq_ignore_ascii_case("json");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        self.socket_addr()?;
        self.sources.validate()?;
        self.engine.validate()?;

        Ok(())
    }

    /// Address the HTTP listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.listen_addr, self.port)
            .parse()
            .map_err(|e| format!("Invalid listen address {}:{}: {}", self.listen_addr, self.port, e))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
