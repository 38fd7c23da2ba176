//! Country Cache Store
//!
//! Durable keyed collection of merged country rows.
//!
//! Readers see an immutable [`CountrySnapshot`] behind an `Arc`. Writers
//! build the next snapshot off to the side, persist it through a
//! [`CountryRepository`], and only then swap the pointer, so a reader
//! observes either the old set or the new set and never a mix.

pub mod snapshot;
pub mod repository;
pub mod sqlite;
pub mod store;

pub use snapshot::CountrySnapshot;
pub use repository::{CountryRepository, MemoryRepository};
pub use sqlite::SqliteRepository;
pub use store::CountryStore;
