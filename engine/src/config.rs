//! Engine configuration.

use std::time::Duration;

use countrycache_common::time::constants;

/// Configuration for the refresh engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Deadline for fetching both upstream sources.
    pub fetch_deadline: Duration,
    /// Seed for the GDP multiplier draws. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_deadline: constants::refresh_fetch_deadline(),
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("REFRESH_DEADLINE_SECS") {
            if let Ok(secs) = secs.parse() {
                config.fetch_deadline = Duration::from_secs(secs);
            }
        }

        if let Ok(seed) = std::env::var("GDP_SEED") {
            if let Ok(seed) = seed.parse() {
                config.rng_seed = Some(seed);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.fetch_deadline.is_zero() {
            return Err("Refresh fetch deadline cannot be zero".to_string());
        }

        Ok(())
    }
}
