//! The shared country cache.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use countrycache_common::{
    CacheResult, CacheStatus, CountryCacheError, CountryQuery, MergedCountry,
};

use crate::repository::{CountryRepository, MemoryRepository};
use crate::snapshot::CountrySnapshot;

/// Country cache shared by the refresh path and the query path.
///
/// Reads clone the current `Arc<CountrySnapshot>` and never wait on a
/// writer. `replace_all` and `delete` take the writer mutex for the whole
/// persist-then-swap sequence, so they never interleave.
pub struct CountryStore {
    current: RwLock<Arc<CountrySnapshot>>,
    writer: Mutex<()>,
    repository: Arc<dyn CountryRepository>,
}

impl CountryStore {
    /// Open a store over `repository`, loading whatever it holds.
    #[instrument(skip(repository))]
    pub async fn open(repository: Arc<dyn CountryRepository>) -> CacheResult<Self> {
        let rows = repository.load_all().await?;
        let snapshot = CountrySnapshot::from_rows(rows);

        info!(countries = snapshot.len(), "Country store opened");

        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
            repository,
        })
    }

    /// Create an empty store without durable backing.
    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(Arc::new(CountrySnapshot::empty())),
            writer: Mutex::new(()),
            repository: Arc::new(MemoryRepository::new()),
        }
    }

    /// The current generation of the cache.
    pub fn snapshot(&self) -> Arc<CountrySnapshot> {
        self.current.read().clone()
    }

    /// Atomically replace the whole set. Returns the stored row count.
    ///
    /// On error the previous set stays visible and durable.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn replace_all(&self, rows: Vec<MergedCountry>) -> CacheResult<usize> {
        let next = Arc::new(CountrySnapshot::from_rows(rows));

        let _guard = self.writer.lock().await;

        if let Err(e) = self.repository.replace_all(&next.to_rows()).await {
            warn!(error = %e, "Persisting refreshed countries failed, keeping previous set");
            return Err(e);
        }

        let count = next.len();
        *self.current.write() = next;

        info!(countries = count, "Country set replaced");
        Ok(count)
    }

    /// Get one country by name, ignoring case.
    pub fn get(&self, name: &str) -> CacheResult<MergedCountry> {
        self.snapshot()
            .get(name)
            .cloned()
            .ok_or_else(|| CountryCacheError::NotFound(name.to_string()))
    }

    /// Countries matching `query`.
    pub fn list(&self, query: &CountryQuery) -> Vec<MergedCountry> {
        self.snapshot().query(query)
    }

    /// Delete one country by name, returning the removed row.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> CacheResult<MergedCountry> {
        let _guard = self.writer.lock().await;

        let current = self.snapshot();
        let removed = current
            .get(name)
            .cloned()
            .ok_or_else(|| CountryCacheError::NotFound(name.to_string()))?;

        self.repository.delete(name).await?;

        *self.current.write() = Arc::new(current.without(name));

        info!(name = %removed.name, "Country deleted");
        Ok(removed)
    }

    /// Row count and freshness.
    pub fn status(&self) -> CacheStatus {
        self.snapshot().status()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
