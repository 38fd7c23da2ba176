//! Refresh orchestration: fetch, merge, commit.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use countrycache_common::{
    time, CacheResult, CountryCacheError, CountryRecord, ExchangeRateTable, Timestamp,
};
use countrycache_sources::{CountrySource, RateSource};
use countrycache_store::CountryStore;

use crate::config::EngineConfig;
use crate::merger;
use crate::metrics::RefreshMetrics;

/// Result of a committed refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    /// Correlation ID of this refresh in logs.
    pub refresh_id: Uuid,
    /// Rows committed to the store.
    pub refreshed_count: usize,
    /// Timestamp stamped on every committed row.
    pub refreshed_at: Timestamp,
}

/// Runs refreshes against the two upstream sources and commits each one
/// to the store as a single unit.
///
/// At most one refresh runs at a time; a concurrent call is rejected with
/// `RefreshInProgress` rather than queued.
pub struct RefreshOrchestrator {
    countries: Arc<dyn CountrySource>,
    rates: Arc<dyn RateSource>,
    store: Arc<CountryStore>,
    rng: Mutex<StdRng>,
    in_flight: tokio::sync::Mutex<()>,
    metrics: Arc<RefreshMetrics>,
    config: EngineConfig,
}

impl RefreshOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        countries: Arc<dyn CountrySource>,
        rates: Arc<dyn RateSource>,
        store: Arc<CountryStore>,
        config: EngineConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            countries,
            rates,
            store,
            rng: Mutex::new(rng),
            in_flight: tokio::sync::Mutex::new(()),
            metrics: Arc::new(RefreshMetrics::new()),
            config,
        }
    }

    /// Run one full fetch-merge-commit cycle.
    ///
    /// The store changes only at the final commit. Any upstream failure,
    /// validation failure or deadline overrun returns before that point and
    /// leaves the cache exactly as it was.
    pub async fn refresh(&self) -> CacheResult<RefreshOutcome> {
        let _slot = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.metrics.refresh_rejected();
                warn!("Refresh requested while another is running");
                return Err(CountryCacheError::RefreshInProgress);
            }
        };

        self.metrics.refresh_started();
        let result = self.run(Uuid::now_v7()).await;

        match &result {
            Ok(outcome) => self.metrics.refresh_succeeded(outcome.refreshed_count),
            Err(_) => self.metrics.refresh_failed(),
        }
        info!(metrics = ?self.metrics.snapshot(), "Refresh metrics");

        result
    }

    /// Whether a refresh currently holds the refresh slot.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Refresh counters.
    pub fn metrics(&self) -> Arc<RefreshMetrics> {
        self.metrics.clone()
    }

    /// The store refreshes commit to.
    pub fn store(&self) -> &Arc<CountryStore> {
        &self.store
    }

    #[instrument(name = "refresh", skip(self))]
    async fn run(&self, refresh_id: Uuid) -> CacheResult<RefreshOutcome> {
        info!("Refresh started");

        let (countries, rates) = match self.fetch_all().await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Refresh aborted, cache untouched");
                return Err(e);
            }
        };

        let refreshed_at = time::now();
        let merged = {
            let mut rng = self.rng.lock();
            merger::merge(&countries, &rates, refreshed_at, &mut *rng)
        };

        let refreshed_count = self.store.replace_all(merged).await?;

        info!(
            countries = refreshed_count,
            rates = rates.len(),
            refreshed_at = %refreshed_at,
            "Refresh committed"
        );

        Ok(RefreshOutcome {
            refresh_id,
            refreshed_count,
            refreshed_at,
        })
    }

    /// Fetch both sources concurrently under the configured deadline.
    async fn fetch_all(&self) -> CacheResult<(Vec<CountryRecord>, ExchangeRateTable)> {
        let fetch = async {
            tokio::try_join!(self.countries.fetch_countries(), self.rates.fetch_rates())
        };

        match tokio::time::timeout(self.config.fetch_deadline, fetch).await {
            Ok(result) => result,
            Err(_) => Err(CountryCacheError::source_unavailable(
                format!("{} / {}", self.countries.name(), self.rates.name()),
                format!("no response within {:?}", self.config.fetch_deadline),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use countrycache_common::{CountryQuery, CurrencyCode, ValidationErrors};
    use countrycache_sources::{MockCountrySource, MockRateSource};
    use std::time::Duration;

    /// Directory whose payload is missing a required field.
    struct InvalidDirectory;

    #[async_trait]
    impl CountrySource for InvalidDirectory {
        fn name(&self) -> &str {
            "Invalid Countries"
        }

        async fn fetch_countries(&self) -> CacheResult<Vec<CountryRecord>> {
            let mut errors = ValidationErrors::new();
            errors.add("index_3", "name", "is required");
            Err(CountryCacheError::ValidationFailed(errors))
        }
    }

    struct Harness {
        countries: Arc<MockCountrySource>,
        rates: Arc<MockRateSource>,
        store: Arc<CountryStore>,
        orchestrator: Arc<RefreshOrchestrator>,
    }

    fn directory() -> Vec<CountryRecord> {
        vec![
            CountryRecord::new("Nigeria", "Africa", 200_000_000)
                .with_currency("NGN")
                .with_capital("Abuja"),
            CountryRecord::new("Vatican", "Europe", 800),
            CountryRecord::new("X", "Nowhere", 10).with_currency("ZZZ"),
            CountryRecord::new("France", "Europe", 67_000_000).with_currency("EUR"),
        ]
    }

    fn rate_table() -> ExchangeRateTable {
        [("NGN", 1500.0), ("EUR", 0.92)].into_iter().collect()
    }

    fn harness_with(config: EngineConfig) -> Harness {
        let countries = Arc::new(MockCountrySource::new(directory()));
        let rates = Arc::new(MockRateSource::new(rate_table()));
        let store = Arc::new(CountryStore::in_memory());
        let orchestrator = Arc::new(RefreshOrchestrator::new(
            countries.clone(),
            rates.clone(),
            store.clone(),
            config,
        ));

        Harness {
            countries,
            rates,
            store,
            orchestrator,
        }
    }

    fn harness() -> Harness {
        harness_with(EngineConfig {
            rng_seed: Some(7),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_refresh_commits_all_rows_with_one_timestamp() {
        let h = harness();

        let outcome = h.orchestrator.refresh().await.unwrap();

        assert_eq!(outcome.refreshed_count, 4);
        let rows = h.store.list(&CountryQuery::all());
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.last_refreshed_at == outcome.refreshed_at));

        let status = h.store.status();
        assert_eq!(status.total_countries, 4);
        assert_eq!(status.last_refreshed_at, Some(outcome.refreshed_at));

        let nigeria = h.store.get("nigeria").unwrap();
        let gdp = nigeria.estimated_gdp.unwrap();
        assert!(gdp >= 200_000_000.0 * 1000.0 / 1500.0 && gdp < 200_000_000.0 * 2000.0 / 1500.0);

        let vatican = h.store.get("Vatican").unwrap();
        assert_eq!((vatican.exchange_rate, vatican.estimated_gdp), (None, Some(0.0)));

        let x = h.store.get("X").unwrap();
        assert_eq!(x.currency_code, Some(CurrencyCode::new("ZZZ")));
        assert_eq!((x.exchange_rate, x.estimated_gdp), (None, None));
    }

    #[tokio::test]
    async fn test_country_source_failure_leaves_cache_untouched() {
        let h = harness();
        h.orchestrator.refresh().await.unwrap();
        let before = h.store.snapshot();

        h.countries.set_records(vec![CountryRecord::new("Only", "Nowhere", 1)]);
        h.countries.set_failure(Some("connection reset"));

        let result = h.orchestrator.refresh().await;

        assert!(matches!(result, Err(CountryCacheError::SourceUnavailable { .. })));
        assert_eq!(*h.store.snapshot(), *before);
        assert_eq!(h.orchestrator.metrics().snapshot().refreshes_failed, 1);
    }

    #[tokio::test]
    async fn test_rate_source_failure_leaves_cache_untouched() {
        let h = harness();
        h.orchestrator.refresh().await.unwrap();
        let before = h.store.snapshot();

        h.rates.set_failure(Some("503 from upstream"));
        let result = h.orchestrator.refresh().await;

        assert!(matches!(result, Err(CountryCacheError::SourceUnavailable { .. })));
        assert_eq!(*h.store.snapshot(), *before);
    }

    #[tokio::test]
    async fn test_failure_on_empty_cache_stays_empty() {
        let h = harness();
        h.rates.set_failure(Some("down"));

        tokio_test::assert_err!(h.orchestrator.refresh().await);
        assert!(h.store.is_empty());
        assert_eq!(h.store.status().last_refreshed_at, None);
    }

    #[tokio::test]
    async fn test_invalid_directory_leaves_cache_untouched() {
        let h = harness();
        h.orchestrator.refresh().await.unwrap();
        let before = h.store.snapshot();

        let invalid = RefreshOrchestrator::new(
            Arc::new(InvalidDirectory),
            h.rates.clone(),
            h.store.clone(),
            EngineConfig::default(),
        );
        let result = invalid.refresh().await;

        match result {
            Err(CountryCacheError::ValidationFailed(errors)) => {
                assert_eq!(errors.record("index_3").unwrap()["name"], "is required");
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert_eq!(*h.store.snapshot(), *before);
    }

    #[tokio::test]
    async fn test_second_refresh_rejected_while_running() {
        let h = harness();
        h.countries.set_delay(Some(Duration::from_millis(300)));

        let first = {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move { orchestrator.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.orchestrator.is_refreshing());

        let second = h.orchestrator.refresh().await;
        assert!(matches!(second, Err(CountryCacheError::RefreshInProgress)));

        let first = first.await.unwrap();
        assert_eq!(first.unwrap().refreshed_count, 4);
        assert_eq!(h.countries.calls(), 1);

        let metrics = h.orchestrator.metrics().snapshot();
        assert_eq!(metrics.refreshes_rejected, 1);
        assert_eq!(metrics.refreshes_succeeded, 1);
    }

    #[tokio::test]
    async fn test_fetch_deadline_aborts_refresh() {
        let h = harness_with(EngineConfig {
            fetch_deadline: Duration::from_millis(100),
            rng_seed: Some(1),
        });
        h.countries.set_delay(Some(Duration::from_millis(500)));

        let result = h.orchestrator.refresh().await;

        assert!(matches!(result, Err(CountryCacheError::SourceUnavailable { .. })));
        assert!(h.store.is_empty());
        assert!(!h.orchestrator.is_refreshing());
    }

    #[tokio::test]
    async fn test_repeat_refresh_has_same_shape() {
        let h = harness();
        let first = h.orchestrator.refresh().await.unwrap();
        let rows_a = h.store.list(&CountryQuery::all());

        let second = h.orchestrator.refresh().await.unwrap();
        let rows_b = h.store.list(&CountryQuery::all());

        assert_eq!(first.refreshed_count, second.refreshed_count);
        assert_ne!(first.refresh_id, second.refresh_id);
        assert!(second.refreshed_at >= first.refreshed_at);
        for (a, b) in rows_a.iter().zip(&rows_b) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.capital, b.capital);
            assert_eq!(a.region, b.region);
            assert_eq!(a.population, b.population);
            assert_eq!(a.currency_code, b.currency_code);
            assert_eq!(a.exchange_rate, b.exchange_rate);
            assert_eq!(a.flag_url, b.flag_url);
        }
    }

    #[tokio::test]
    async fn test_seeded_orchestrators_agree() {
        let a = harness();
        let b = harness();

        a.orchestrator.refresh().await.unwrap();
        b.orchestrator.refresh().await.unwrap();

        assert_eq!(
            a.store.get("France").unwrap().estimated_gdp,
            b.store.get("France").unwrap().estimated_gdp
        );
    }

    #[tokio::test]
    async fn test_vanished_countries_dropped() {
        let h = harness();
        h.orchestrator.refresh().await.unwrap();

        h.countries.set_records(vec![CountryRecord::new("Chad", "Africa", 17_000_000)]);
        let outcome = h.orchestrator.refresh().await.unwrap();

        assert_eq!(outcome.refreshed_count, 1);
        assert!(h.store.get("Nigeria").is_err());
        assert!(h.store.get("Chad").is_ok());
    }

    #[tokio::test]
    async fn test_rate_change_applies_on_next_refresh() {
        let h = harness();
        h.orchestrator.refresh().await.unwrap();

        h.rates.set_table([("EUR", 0.5)].into_iter().collect());
        h.orchestrator.refresh().await.unwrap();

        assert_eq!(h.store.get("France").unwrap().exchange_rate, Some(0.5));
        let nigeria = h.store.get("Nigeria").unwrap();
        assert_eq!((nigeria.exchange_rate, nigeria.estimated_gdp), (None, None));
    }
}
