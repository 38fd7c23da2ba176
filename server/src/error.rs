//! Mapping of cache errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use countrycache_common::CountryCacheError;

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub CountryCacheError);

impl From<CountryCacheError> for ApiError {
    fn from(err: CountryCacheError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Status code and JSON body for this error.
    fn parts(&self) -> (StatusCode, serde_json::Value) {
        match &self.0 {
            CountryCacheError::SourceUnavailable { provider, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "External data source unavailable",
                    "details": format!("Could not fetch data from {}", provider),
                }),
            ),
            CountryCacheError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Country not found" }),
            ),
            CountryCacheError::ValidationFailed(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "details": details }),
            ),
            CountryCacheError::InvalidQuery(reason) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid query", "details": reason }),
            ),
            CountryCacheError::RefreshInProgress => (
                StatusCode::CONFLICT,
                json!({ "error": "Refresh already in progress" }),
            ),
            CountryCacheError::Storage(_) | CountryCacheError::Configuration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();

        if status.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), status = %status, "Request failed");
        } else {
            warn!(error = %self.0, code = self.0.error_code(), status = %status, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}
