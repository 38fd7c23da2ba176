//! Country Cache Sources
//!
//! Clients for the two upstream providers a refresh pulls from: the
//! country directory and the exchange-rate feed.
//!
//! Both clients are pure fetch-and-parse. They do not retry, cache or
//! write anywhere; any failure surfaces as
//! [`CountryCacheError::SourceUnavailable`](countrycache_common::CountryCacheError).
//!
//! # Example
//!
//! ```rust,ignore
//! use countrycache_sources::{build_client, RestCountriesSource, SourceConfig};
//!
//! let config = SourceConfig::from_env();
//! let client = build_client(&config)?;
//! let countries = RestCountriesSource::new(client, config.countries_url.clone());
//! let records = countries.fetch_countries().await?;
//! ```

pub mod provider;
pub mod config;
pub mod payload;
pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use provider::{CountrySource, RateSource};
pub use config::SourceConfig;
pub use http::{build_client, ExchangeRateApiSource, RestCountriesSource};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockCountrySource, MockRateSource};
