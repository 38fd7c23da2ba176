//! CountryCache HTTP server
//!
//! Exposes refresh, query, delete and status operations over the country
//! cache as a JSON API.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
