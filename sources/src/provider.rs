//! Source traits for the upstream providers.

use async_trait::async_trait;
use countrycache_common::{CacheResult, CountryRecord, ExchangeRateTable};

/// A provider of country directory records.
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Get the provider name used in logs and error details.
    fn name(&self) -> &str;

    /// Fetch every country the provider knows about.
    ///
    /// Fails with `SourceUnavailable` on network or HTTP errors and on
    /// payloads that cannot be parsed, and with `ValidationFailed` when
    /// records lack required fields.
    async fn fetch_countries(&self) -> CacheResult<Vec<CountryRecord>>;
}

/// A provider of exchange rates against USD.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the provider name used in logs and error details.
    fn name(&self) -> &str;

    /// Fetch the current rate table.
    async fn fetch_rates(&self) -> CacheResult<ExchangeRateTable>;
}
