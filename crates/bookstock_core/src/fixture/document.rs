//! Fixture document decoding.
//!
//! # Responsibility
//! - Define the on-disk record shape (`model` / `pk` / `fields`).
//! - Read fixture files into memory without interpreting field values.
//!
//! # Invariants
//! - `pk` and `fields` are optional in the document and default when absent.
//! - Field values stay untyped JSON here; the loader applies kind-specific
//!   typing rules.

use crate::model::entities::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One record of a fixture document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// Destination kind tag, one of `publisher|shop|book|stock|sale`.
    /// Unrecognized tags are skipped by the loader, not rejected.
    pub model: String,
    /// Caller-supplied primary key; SQLite assigns one when absent.
    #[serde(default)]
    pub pk: Option<EntityId>,
    /// Kind-specific column values.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug)]
pub enum DocumentError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read fixture file: {err}"),
            Self::Json(err) => write!(f, "cannot decode fixture document: {err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Reads a JSON fixture file into a record sequence.
///
/// The document must be a JSON array of records; record order is preserved.
pub fn read_fixture_file(path: impl AsRef<Path>) -> Result<Vec<FixtureRecord>, DocumentError> {
    let file = File::open(path.as_ref())?;
    let records = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::FixtureRecord;
    use serde_json::json;

    #[test]
    fn decodes_full_record() {
        let record: FixtureRecord = serde_json::from_value(json!({
            "model": "book",
            "pk": 10,
            "fields": {"title": "Dead Souls", "id_publisher": 1}
        }))
        .unwrap();

        assert_eq!(record.model, "book");
        assert_eq!(record.pk, Some(10));
        assert_eq!(record.fields["title"], json!("Dead Souls"));
    }

    #[test]
    fn pk_and_fields_default_when_absent() {
        let record: FixtureRecord =
            serde_json::from_value(json!({"model": "publisher"})).unwrap();

        assert_eq!(record.pk, None);
        assert!(record.fields.is_empty());
    }

    #[test]
    fn record_order_is_preserved() {
        let records: Vec<FixtureRecord> = serde_json::from_value(json!([
            {"model": "sale"},
            {"model": "publisher"},
            {"model": "sale"}
        ]))
        .unwrap();

        let models: Vec<&str> = records.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, ["sale", "publisher", "sale"]);
    }
}
