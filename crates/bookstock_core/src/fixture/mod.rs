//! Fixture loading: document decoding and the dependency-aware loader.
//!
//! # Responsibility
//! - Decode JSON fixture documents into typed records.
//! - Load records in dependency order inside one transaction.
//!
//! # Invariants
//! - A load either commits every recognized record or none of them.

pub mod document;
pub mod loader;
