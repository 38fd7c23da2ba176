//! Read and delete operations over the cached set.

use std::sync::Arc;

use tracing::{debug, instrument};

use countrycache_common::{CacheResult, CacheStatus, CountryQuery, MergedCountry};
use countrycache_store::CountryStore;

/// Query-side handle on the country store.
///
/// Reads work from the current snapshot and run concurrently with a
/// refresh; they see either the previous set or the new one.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<CountryStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<CountryStore>) -> Self {
        Self { store }
    }

    /// Countries matching `query`, filtered then sorted.
    pub fn list(&self, query: &CountryQuery) -> Vec<MergedCountry> {
        let rows = self.store.list(query);
        debug!(
            region = ?query.region,
            currency = ?query.currency,
            sort = ?query.sort,
            results = rows.len(),
            "Listed countries"
        );
        rows
    }

    /// One country by name, ignoring case.
    pub fn get(&self, name: &str) -> CacheResult<MergedCountry> {
        self.store.get(name)
    }

    /// Remove one country until the next refresh brings it back.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> CacheResult<MergedCountry> {
        self.store.delete(name).await
    }

    pub fn status(&self) -> CacheStatus {
        self.store.status()
    }
}
