//! Domain model for the bookstore schema.
//!
//! # Responsibility
//! - Define the closed set of entity kinds the fixture loader accepts.
//! - Define the row shapes persisted by the store repository.
//!
//! # Invariants
//! - Entity identifiers are caller-supplied or SQLite-assigned, never
//!   generated here.
//! - The kind set is fixed; unknown fixture tags are not representable.

pub mod entities;
