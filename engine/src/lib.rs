//! Country Cache Engine
//!
//! The refresh-and-cache engine: merges country directory records with
//! exchange rates, commits each refresh to the store as one unit, and
//! serves filtered views of the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use countrycache_engine::{EngineConfig, QueryEngine, RefreshOrchestrator};
//!
//! let orchestrator = RefreshOrchestrator::new(countries, rates, store.clone(), EngineConfig::from_env());
//! let outcome = orchestrator.refresh().await?;
//!
//! let queries = QueryEngine::new(store);
//! let status = queries.status();
//! ```

pub mod config;
pub mod merger;
pub mod orchestrator;
pub mod query;
pub mod metrics;

pub use config::EngineConfig;
pub use merger::{merge, GDP_MULTIPLIER_MAX, GDP_MULTIPLIER_MIN};
pub use orchestrator::{RefreshOrchestrator, RefreshOutcome};
pub use query::QueryEngine;
pub use metrics::{RefreshMetrics, RefreshMetricsSnapshot};
