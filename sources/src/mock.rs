//! In-memory sources for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use countrycache_common::{CacheResult, CountryCacheError, CountryRecord, ExchangeRateTable};

use crate::provider::{CountrySource, RateSource};

/// Country source serving a fixed record list, or a scripted failure.
pub struct MockCountrySource {
    records: RwLock<Vec<CountryRecord>>,
    failure: RwLock<Option<String>>,
    delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockCountrySource {
    pub fn new(records: Vec<CountryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            failure: RwLock::new(None),
            delay: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the served records.
    pub fn set_records(&self, records: Vec<CountryRecord>) {
        *self.records.write() = records;
    }

    /// Fail every subsequent fetch with `reason`, or stop failing with `None`.
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.write() = reason.map(str::to_string);
    }

    /// Sleep before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CountrySource for MockCountrySource {
    fn name(&self) -> &str {
        "Mock Countries"
    }

    async fn fetch_countries(&self) -> CacheResult<Vec<CountryRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.read().clone();
        match failure {
            Some(reason) => Err(CountryCacheError::source_unavailable(self.name(), reason)),
            None => Ok(self.records.read().clone()),
        }
    }
}

/// Rate source serving a fixed table, or a scripted failure.
pub struct MockRateSource {
    table: RwLock<ExchangeRateTable>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl MockRateSource {
    pub fn new(table: ExchangeRateTable) -> Self {
        Self {
            table: RwLock::new(table),
            failure: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the served table.
    pub fn set_table(&self, table: ExchangeRateTable) {
        *self.table.write() = table;
    }

    /// Fail every subsequent fetch with `reason`, or stop failing with `None`.
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.write() = reason.map(str::to_string);
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        "Mock Rates"
    }

    async fn fetch_rates(&self) -> CacheResult<ExchangeRateTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failure = self.failure.read().clone();
        match failure {
            Some(reason) => Err(CountryCacheError::source_unavailable(self.name(), reason)),
            None => Ok(self.table.read().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_country_source() {
        let source = MockCountrySource::new(vec![CountryRecord::new("Chad", "Africa", 17_000_000)]);

        let records = source.fetch_countries().await.unwrap();
        assert_eq!(records.len(), 1);

        source.set_failure(Some("down"));
        assert!(source.fetch_countries().await.is_err());

        source.set_failure(None);
        assert!(source.fetch_countries().await.is_ok());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_rate_source() {
        let source = MockRateSource::new([("EUR", 0.92)].into_iter().collect());
        assert_eq!(source.fetch_rates().await.unwrap().len(), 1);

        source.set_failure(Some("down"));
        let err = source.fetch_rates().await.unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
    }
}
