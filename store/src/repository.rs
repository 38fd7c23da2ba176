//! Durable storage seam for the cache.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use countrycache_common::{CacheResult, CountryKey, MergedCountry};

/// Durable table of merged countries keyed by case-folded name.
///
/// Implementations must make `replace_all` all-or-nothing: on error the
/// previously stored set is still intact.
#[async_trait]
pub trait CountryRepository: Send + Sync {
    /// Load every stored row.
    async fn load_all(&self) -> CacheResult<Vec<MergedCountry>>;

    /// Replace the stored set with `rows` in one transaction.
    async fn replace_all(&self, rows: &[MergedCountry]) -> CacheResult<()>;

    /// Delete one row. Returns whether a row was removed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;
}

/// Non-durable repository held in process memory.
#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<BTreeMap<CountryKey, MergedCountry>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

#[async_trait]
impl CountryRepository for MemoryRepository {
    async fn load_all(&self) -> CacheResult<Vec<MergedCountry>> {
        Ok(self.rows.lock().values().cloned().collect())
    }

    async fn replace_all(&self, rows: &[MergedCountry]) -> CacheResult<()> {
        let next = rows.iter().map(|r| (r.key(), r.clone())).collect();
        *self.rows.lock() = next;
        Ok(())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        Ok(self.rows.lock().remove(&CountryKey::new(name)).is_some())
    }
}
