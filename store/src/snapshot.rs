//! Immutable view of the cached country set.

use std::collections::BTreeMap;

use tracing::warn;

use countrycache_common::{time, CacheStatus, CountryKey, CountryQuery, MergedCountry};

/// One complete generation of the cache, keyed by case-folded name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountrySnapshot {
    rows: BTreeMap<CountryKey, MergedCountry>,
}

impl CountrySnapshot {
    /// Create an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from rows. A later row replaces an earlier one
    /// with the same key.
    pub fn from_rows(rows: Vec<MergedCountry>) -> Self {
        let mut map = BTreeMap::new();
        for row in rows {
            if let Some(previous) = map.insert(row.key(), row) {
                warn!(name = %previous.name, "Duplicate country name, keeping last occurrence");
            }
        }
        Self { rows: map }
    }

    /// Look up a row by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&MergedCountry> {
        self.rows.get(&CountryKey::new(name))
    }

    /// Copy of this snapshot without the named row.
    pub fn without(&self, name: &str) -> Self {
        let mut rows = self.rows.clone();
        rows.remove(&CountryKey::new(name));
        Self { rows }
    }

    /// Rows matching a query, in its sort order (name order when unsorted).
    pub fn query(&self, query: &CountryQuery) -> Vec<MergedCountry> {
        query.apply(self.rows.values())
    }

    /// Iterate rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = &MergedCountry> {
        self.rows.values()
    }

    /// Clone out all rows in key order.
    pub fn to_rows(&self) -> Vec<MergedCountry> {
        self.rows.values().cloned().collect()
    }

    /// Row count and freshness.
    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            total_countries: self.rows.len(),
            last_refreshed_at: time::latest(self.rows.values().map(|r| r.last_refreshed_at)),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use countrycache_common::Timestamp;

    fn row(name: &str, population: u64, at: Timestamp) -> MergedCountry {
        MergedCountry {
            name: name.to_string(),
            capital: None,
            region: "Africa".to_string(),
            population,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: Some(0.0),
            flag_url: None,
            last_refreshed_at: at,
        }
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let snapshot = CountrySnapshot::from_rows(vec![row("Nigeria", 1, time::now())]);

        assert!(snapshot.get("nigeria").is_some());
        assert_eq!(snapshot.get("NIGERIA").unwrap().name, "Nigeria");
        assert!(snapshot.get("Niger").is_none());
    }

    #[test]
    fn test_duplicate_names_keep_last() {
        let at = time::now();
        let snapshot = CountrySnapshot::from_rows(vec![row("Chad", 1, at), row("CHAD", 2, at)]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("chad").unwrap().population, 2);
    }

    #[test]
    fn test_without_leaves_original_intact() {
        let at = time::now();
        let snapshot = CountrySnapshot::from_rows(vec![row("Chad", 1, at), row("Mali", 2, at)]);

        let trimmed = snapshot.without("mali");
        assert_eq!(trimmed.len(), 1);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_status() {
        assert_eq!(CountrySnapshot::empty().status().last_refreshed_at, None);

        let t0 = time::now();
        let t1 = t0 + Duration::seconds(30);
        let snapshot = CountrySnapshot::from_rows(vec![row("Chad", 1, t0), row("Mali", 2, t1)]);

        let status = snapshot.status();
        assert_eq!(status.total_countries, 2);
        assert_eq!(status.last_refreshed_at, Some(t1));
    }
}
