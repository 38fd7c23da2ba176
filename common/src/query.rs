//! Filter and sort options for listing cached countries.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CountryCacheError;
use crate::identifiers::CurrencyCode;
use crate::model::MergedCountry;

/// Sort order for country listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Estimated GDP, largest first; rows without an estimate last.
    GdpDesc,
}

impl SortOrder {
    /// Compare two rows under this order. Ties break on name.
    pub fn compare(&self, a: &MergedCountry, b: &MergedCountry) -> Ordering {
        match self {
            SortOrder::GdpDesc => match (a.estimated_gdp, b.estimated_gdp) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.name.cmp(&b.name)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::GdpDesc => "gdp_desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = CountryCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gdp_desc" => Ok(SortOrder::GdpDesc),
            other => Err(CountryCacheError::InvalidQuery(format!(
                "unsupported sort '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjunctive filter plus optional sort over the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryQuery {
    /// Exact, case-sensitive region match.
    pub region: Option<String>,
    /// Exact, case-sensitive currency code match.
    pub currency: Option<String>,
    pub sort: Option<SortOrder>,
}

impl CountryQuery {
    /// Query matching every row, unsorted.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        self.currency = Some(code.into());
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Check whether a row satisfies every supplied filter.
    pub fn matches(&self, country: &MergedCountry) -> bool {
        if let Some(region) = &self.region {
            if &country.region != region {
                return false;
            }
        }

        if let Some(currency) = &self.currency {
            if country.currency_code.as_ref().map(CurrencyCode::as_str) != Some(currency.as_str()) {
                return false;
            }
        }

        true
    }

    /// Filter and sort a sequence of rows.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<MergedCountry>
    where
        I: IntoIterator<Item = &'a MergedCountry>,
    {
        let mut selected: Vec<MergedCountry> =
            rows.into_iter().filter(|c| self.matches(c)).cloned().collect();

        if let Some(sort) = self.sort {
            selected.sort_by(|a, b| sort.compare(a, b));
        }

        selected
    }
}
