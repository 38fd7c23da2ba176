//! Joins country records with exchange rates.

use rand::Rng;
use tracing::{debug, warn};

use countrycache_common::{CountryRecord, ExchangeRateTable, MergedCountry, Timestamp};

/// Lower bound (inclusive) of the per-country GDP multiplier.
pub const GDP_MULTIPLIER_MIN: f64 = 1000.0;
/// Upper bound (exclusive) of the per-country GDP multiplier.
pub const GDP_MULTIPLIER_MAX: f64 = 2000.0;

/// Merge every country with its currency's rate, stamping each row with
/// `refreshed_at`.
///
/// * no currency: rate null, estimate 0
/// * currency without a usable rate: rate and estimate null
/// * otherwise: estimate = population x U / rate, U drawn from
///   `[GDP_MULTIPLIER_MIN, GDP_MULTIPLIER_MAX)`
///
/// A rate that is zero, negative or not finite counts as unusable.
pub fn merge<R: Rng>(
    countries: &[CountryRecord],
    rates: &ExchangeRateTable,
    refreshed_at: Timestamp,
    rng: &mut R,
) -> Vec<MergedCountry> {
    let merged: Vec<MergedCountry> = countries
        .iter()
        .map(|country| merge_one(country, rates, refreshed_at, &mut *rng))
        .collect();

    debug!(
        countries = merged.len(),
        without_rate = merged.iter().filter(|c| c.estimated_gdp.is_none()).count(),
        "Merged countries with rates"
    );

    merged
}

fn merge_one<R: Rng>(
    country: &CountryRecord,
    rates: &ExchangeRateTable,
    refreshed_at: Timestamp,
    rng: &mut R,
) -> MergedCountry {
    let (exchange_rate, estimated_gdp) = match &country.currency_code {
        None => (None, Some(0.0)),
        Some(code) => match rates.rate(code) {
            Some(rate) if rate.is_finite() && rate > 0.0 => {
                let multiplier = rng.gen_range(GDP_MULTIPLIER_MIN..GDP_MULTIPLIER_MAX);
                (Some(rate), Some(country.population as f64 * multiplier / rate))
            }
            Some(rate) => {
                warn!(country = %country.name, currency = %code, rate, "Ignoring non-positive exchange rate");
                (None, None)
            }
            None => (None, None),
        },
    };

    MergedCountry {
        name: country.name.clone(),
        capital: country.capital.clone(),
        region: country.region.clone(),
        population: country.population,
        currency_code: country.currency_code.clone(),
        exchange_rate,
        estimated_gdp,
        flag_url: country.flag_url.clone(),
        last_refreshed_at: refreshed_at,
    }
}
