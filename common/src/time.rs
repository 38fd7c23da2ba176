//! Time utilities and constants for the country cache.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Timing defaults.
pub mod constants {
    use super::Duration;

    /// Per-request timeout for upstream sources (10 seconds).
    pub fn source_request_timeout() -> Duration {
        Duration::from_secs(10)
    }

    /// Deadline for fetching both upstream sources in one refresh (30 seconds).
    pub fn refresh_fetch_deadline() -> Duration {
        Duration::from_secs(30)
    }
}

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Latest of a sequence of timestamps, `None` if empty.
pub fn latest<I>(timestamps: I) -> Option<Timestamp>
where
    I: IntoIterator<Item = Timestamp>,
{
    timestamps.into_iter().max()
}
