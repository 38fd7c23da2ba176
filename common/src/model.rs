//! Country records as fetched upstream and as cached.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::identifiers::{CountryKey, CurrencyCode};
use crate::time::Timestamp;

/// A country as reported by the country directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    /// Country name (unique key, compared case-insensitively).
    pub name: String,
    /// Capital city, if any.
    pub capital: Option<String>,
    /// Region (continent grouping).
    pub region: String,
    /// Population head count.
    pub population: u64,
    /// Official currency, absent if the country has none.
    pub currency_code: Option<CurrencyCode>,
    /// Flag image URL.
    pub flag_url: Option<String>,
}

impl CountryRecord {
    /// Create a record with the required fields only.
    pub fn new(name: impl Into<String>, region: impl Into<String>, population: u64) -> Self {
        Self {
            name: name.into(),
            capital: None,
            region: region.into(),
            population,
            currency_code: None,
            flag_url: None,
        }
    }

    /// Set the currency code.
    pub fn with_currency(mut self, code: impl Into<CurrencyCode>) -> Self {
        self.currency_code = Some(code.into());
        self
    }

    /// Set the capital.
    pub fn with_capital(mut self, capital: impl Into<String>) -> Self {
        self.capital = Some(capital.into());
        self
    }

    /// Set the flag URL.
    pub fn with_flag_url(mut self, url: impl Into<String>) -> Self {
        self.flag_url = Some(url.into());
        self
    }

    /// Cache key for this record.
    pub fn key(&self) -> CountryKey {
        CountryKey::new(&self.name)
    }
}

/// Snapshot of the exchange-rate feed: units of currency per one unit of
/// the base currency (USD).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    rates: HashMap<CurrencyCode, f64>,
}

impl ExchangeRateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a rate.
    pub fn insert(&mut self, code: impl Into<CurrencyCode>, rate: f64) {
        self.rates.insert(code.into(), rate);
    }

    /// Look up the rate for a currency.
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Number of currencies in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<C: Into<CurrencyCode>> FromIterator<(C, f64)> for ExchangeRateTable {
    fn from_iter<I: IntoIterator<Item = (C, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }
}

/// A country merged with its exchange rate, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: String,
    pub population: u64,
    pub currency_code: Option<CurrencyCode>,
    /// Rate against USD; null when there is no currency or no usable rate.
    pub exchange_rate: Option<f64>,
    /// Zero when the country has no currency, null when the rate is missing.
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    /// Timestamp of the refresh that produced this row.
    pub last_refreshed_at: Timestamp,
}

impl MergedCountry {
    /// Cache key for this row.
    pub fn key(&self) -> CountryKey {
        CountryKey::new(&self.name)
    }
}

/// Aggregate view of the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub total_countries: usize,
    /// Most recent refresh timestamp among cached rows, null when empty.
    pub last_refreshed_at: Option<Timestamp>,
}
