//! Core domain logic for bookstock.
//! This crate owns the bookstore schema and the fixture-loading invariants.

pub mod db;
pub mod fixture;
pub mod logging;
pub mod model;
pub mod repo;

pub use fixture::document::{read_fixture_file, DocumentError, FixtureRecord};
pub use fixture::loader::{load_fixture_file, load_records, LoadError, LoadResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entities::{Book, EntityId, EntityKind, Publisher, Sale, Shop, Stock};
pub use repo::store_repo::{
    PublisherRef, PublisherSaleRow, RepoError, RepoResult, SqliteStoreRepository, StoreRepository,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
