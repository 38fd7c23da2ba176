//! Country Cache Common Types
//!
//! Shared types used across the country cache crates: the upstream and
//! cached country records, the query surface over the cache, the error
//! taxonomy and time helpers.

pub mod identifiers;
pub mod model;
pub mod query;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use model::*;
pub use query::*;
pub use error::*;
pub use time::*;
