//! Error types for the country cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Main error type for country cache operations.
#[derive(Error, Debug)]
pub enum CountryCacheError {
    /// An upstream source failed: network error, timeout, non-success
    /// status or malformed payload.
    #[error("{provider} unavailable: {reason}")]
    SourceUnavailable { provider: String, reason: String },

    /// Country absent from the cache.
    #[error("Country not found: {0}")]
    NotFound(String),

    /// Upstream records are missing required fields.
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    /// Another refresh holds the refresh slot.
    #[error("A refresh is already in progress")]
    RefreshInProgress,

    /// Unsupported filter or sort value.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Durable storage failed; in-memory state is unchanged.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CountryCacheError {
    /// Shorthand for a source failure.
    pub fn source_unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        CountryCacheError::SourceUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a storage failure.
    pub fn storage(err: impl fmt::Display) -> Self {
        CountryCacheError::Storage(err.to_string())
    }

    /// Check if the caller may retry the operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CountryCacheError::SourceUnavailable { .. }
                | CountryCacheError::RefreshInProgress
                | CountryCacheError::Storage(_)
        )
    }

    /// Get the stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            CountryCacheError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            CountryCacheError::NotFound(_) => "NOT_FOUND",
            CountryCacheError::ValidationFailed(_) => "VALIDATION_FAILED",
            CountryCacheError::RefreshInProgress => "REFRESH_IN_PROGRESS",
            CountryCacheError::InvalidQuery(_) => "INVALID_QUERY",
            CountryCacheError::Storage(_) => "STORAGE_ERROR",
            CountryCacheError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type alias for country cache operations.
pub type CacheResult<T> = std::result::Result<T, CountryCacheError>;

/// Per-record validation failures, keyed by country name or `index_<n>`
/// when the name itself is missing. Each entry maps field to message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, BTreeMap<String, String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for one field of one record.
    pub fn add(&mut self, record: impl Into<String>, field: impl Into<String>, message: impl Into<String>) {
        self.0
            .entry(record.into())
            .or_default()
            .insert(field.into(), message.into());
    }

    /// Number of offending records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field failures for one record.
    pub fn record(&self, record: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(record)
    }

    /// Convert into an error if any failure was recorded.
    pub fn into_result(self) -> CacheResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CountryCacheError::ValidationFailed(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid record(s)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CountryCacheError::source_unavailable("Countries API", "timeout");
        assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Countries API unavailable: timeout");

        let err = CountryCacheError::NotFound("Atlantis".to_string());
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation_errors_collects_fields() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.add("index_3", "name", "is required");
        errors.add("index_3", "population", "is required");
        errors.add("Chad", "population", "is required");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.record("index_3").unwrap().len(), 2);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["Chad"]["population"], "is required");

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }
}
