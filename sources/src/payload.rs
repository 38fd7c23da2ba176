//! Wire formats of the upstream providers.

use std::collections::HashMap;

use serde::Deserialize;

use countrycache_common::{
    CacheResult, CountryRecord, CurrencyCode, ExchangeRateTable, ValidationErrors,
};

/// A country entry from the directory (restcountries v2 shape).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountry {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<u64>,
    pub flag: Option<String>,
    pub currencies: Option<Vec<RawCurrency>>,
}

/// A currency entry nested in a country.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrency {
    pub code: Option<String>,
}

impl RawCountry {
    /// Currency of the country: the first listed currency's code.
    fn currency_code(&self) -> Option<CurrencyCode> {
        self.currencies
            .as_ref()
            .and_then(|list| list.first())
            .and_then(|c| c.code.as_deref())
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(CurrencyCode::new)
    }
}

/// Convert directory entries into records.
///
/// Every entry is checked before any is returned, so one call reports all
/// entries missing a name or population.
pub fn into_records(raw: Vec<RawCountry>) -> CacheResult<Vec<CountryRecord>> {
    let mut errors = ValidationErrors::new();
    let mut records = Vec::with_capacity(raw.len());

    for (idx, entry) in raw.into_iter().enumerate() {
        let name = entry
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let label = name.clone().unwrap_or_else(|| format!("index_{}", idx));

        let (name, population) = match (name, entry.population) {
            (Some(name), Some(population)) => (name, population),
            (name, population) => {
                if name.is_none() {
                    errors.add(label.clone(), "name", "is required");
                }
                if population.is_none() {
                    errors.add(label, "population", "is required");
                }
                continue;
            }
        };

        records.push(CountryRecord {
            currency_code: entry.currency_code(),
            name,
            capital: entry.capital.filter(|c| !c.is_empty()),
            region: entry.region.unwrap_or_default(),
            population,
            flag_url: entry.flag,
        });
    }

    errors.into_result()?;
    Ok(records)
}

/// Exchange-rate feed response (open.er-api.com shape).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatesPayload {
    pub result: Option<String>,
    pub base_code: Option<String>,
    pub rates: Option<HashMap<String, f64>>,
    #[serde(rename = "error-type")]
    pub error_type: Option<String>,
}

/// Convert a feed response into a rate table, or a failure reason.
///
/// Rates must be quoted against USD; a feed reporting another base is
/// rejected.
pub fn into_table(payload: RatesPayload) -> Result<ExchangeRateTable, String> {
    if let Some(result) = payload.result.as_deref() {
        if result != "success" {
            return Err(format!(
                "feed reported '{}'{}",
                result,
                payload
                    .error_type
                    .as_deref()
                    .map(|t| format!(" ({})", t))
                    .unwrap_or_default()
            ));
        }
    }

    let rates = payload
        .rates
        .ok_or_else(|| "response has no rates".to_string())?;

    if let Some(base) = payload.base_code.map(CurrencyCode::new) {
        if base != CurrencyCode::usd() {
            return Err(format!("rates quoted against {}, expected USD", base));
        }
    }

    Ok(rates.into_iter().collect())
}
