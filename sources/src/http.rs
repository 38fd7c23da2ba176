//! HTTP implementations of the upstream sources.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use countrycache_common::{
    CacheResult, CountryCacheError, CountryRecord, ExchangeRateTable,
};

use crate::config::SourceConfig;
use crate::payload::{self, RatesPayload, RawCountry};
use crate::provider::{CountrySource, RateSource};

/// Build the shared HTTP client for upstream calls.
pub fn build_client(config: &SourceConfig) -> CacheResult<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| CountryCacheError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// GET a URL and decode its JSON body, mapping every failure to
/// `SourceUnavailable` for `provider`.
async fn get_json<T: DeserializeOwned>(client: &Client, provider: &str, url: &str) -> CacheResult<T> {
    let response = client.get(url).send().await.map_err(|e| {
        warn!(provider, error = %e, "Upstream request failed");
        let reason = if e.is_timeout() {
            "request timed out".to_string()
        } else {
            format!("request failed: {}", e)
        };
        CountryCacheError::source_unavailable(provider, reason)
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(provider, %status, "Upstream returned error status");
        return Err(CountryCacheError::source_unavailable(
            provider,
            format!("unexpected status {}", status),
        ));
    }

    response.json::<T>().await.map_err(|e| {
        warn!(provider, error = %e, "Upstream payload could not be decoded");
        CountryCacheError::source_unavailable(provider, format!("invalid JSON: {}", e))
    })
}

/// Country directory backed by the restcountries v2 API.
pub struct RestCountriesSource {
    client: Client,
    url: String,
}

impl RestCountriesSource {
    pub const NAME: &'static str = "Countries API";

    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CountrySource for RestCountriesSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_countries(&self) -> CacheResult<Vec<CountryRecord>> {
        let raw: Vec<RawCountry> = get_json(&self.client, self.name(), &self.url).await?;
        let records = payload::into_records(raw)?;

        debug!(count = records.len(), "Fetched countries");
        Ok(records)
    }
}

/// Exchange-rate feed backed by the open.er-api.com API.
pub struct ExchangeRateApiSource {
    client: Client,
    url: String,
}

impl ExchangeRateApiSource {
    pub const NAME: &'static str = "Exchange Rates API";

    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> CacheResult<ExchangeRateTable> {
        let response: RatesPayload = get_json(&self.client, self.name(), &self.url).await?;
        let table = payload::into_table(response)
            .map_err(|reason| CountryCacheError::source_unavailable(self.name(), reason))?;

        debug!(count = table.len(), "Fetched exchange rates");
        Ok(table)
    }
}
