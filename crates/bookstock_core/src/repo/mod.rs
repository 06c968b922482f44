//! Repository layer over the bookstore tables.
//!
//! # Responsibility
//! - Define the data access contract the fixture loader stages rows through.
//! - Isolate SQL details from loader orchestration.
//!
//! # Invariants
//! - Repository reads observe rows staged earlier on the same connection or
//!   transaction.
//! - Repository APIs return semantic errors (`PublisherNotFound`) in
//!   addition to database transport errors.

pub mod store_repo;
