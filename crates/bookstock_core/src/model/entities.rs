//! Entity kinds, dependency ranks and row shapes.
//!
//! # Responsibility
//! - Map fixture `model` tags onto the closed entity kind set.
//! - Define the insertion order used by the fixture loader.
//!
//! # Invariants
//! - `dependency_rank` orders parents strictly before their children:
//!   publishers/shops (1) -> books (2) -> stocks (3) -> sales (4).
//! - Tag parsing is case-sensitive; unknown tags sort last with rank 5.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Row identifier in any bookstore table.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntityId = i64;

/// Sort rank assigned to records whose `model` tag is not recognized.
pub const UNKNOWN_KIND_RANK: u8 = 5;

/// Closed set of destination kinds for fixture records.
///
/// The kind set is fixed by the schema; validation rules are kind-specific,
/// so this stays an explicit enum rather than an open registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Publisher,
    Shop,
    Book,
    Stock,
    Sale,
}

impl EntityKind {
    /// Resolves a fixture `model` tag. Tags are case-sensitive.
    pub fn parse_model_tag(tag: &str) -> Option<Self> {
        match tag {
            "publisher" => Some(Self::Publisher),
            "shop" => Some(Self::Shop),
            "book" => Some(Self::Book),
            "stock" => Some(Self::Stock),
            "sale" => Some(Self::Sale),
            _ => None,
        }
    }

    /// Returns the fixture tag for this kind.
    pub fn model_tag(self) -> &'static str {
        match self {
            Self::Publisher => "publisher",
            Self::Shop => "shop",
            Self::Book => "book",
            Self::Stock => "stock",
            Self::Sale => "sale",
        }
    }

    /// Insertion order key. Parents rank strictly below their children.
    pub fn dependency_rank(self) -> u8 {
        match self {
            Self::Publisher | Self::Shop => 1,
            Self::Book => 2,
            Self::Stock => 3,
            Self::Sale => 4,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_tag())
    }
}

/// Sort key for a raw fixture tag; unrecognized tags sort last.
pub fn dependency_rank_for_tag(tag: &str) -> u8 {
    EntityKind::parse_model_tag(tag).map_or(UNKNOWN_KIND_RANK, EntityKind::dependency_rank)
}

/// Book publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: EntityId,
    pub name: String,
}

/// Bookstore location selling stocked books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: EntityId,
    pub name: String,
}

/// Published title; always belongs to one publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: EntityId,
    pub title: String,
    pub id_publisher: EntityId,
}

/// Per-shop inventory line for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: EntityId,
    pub id_book: EntityId,
    pub id_shop: EntityId,
    pub count: i64,
}

/// One recorded sale against a stock line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: EntityId,
    pub id_stock: EntityId,
    pub price: f64,
    pub date_sale: NaiveDate,
}
