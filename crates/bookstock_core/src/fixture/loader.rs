//! Dependency-aware fixture loader.
//!
//! # Responsibility
//! - Order fixture records so parents are inserted before children.
//! - Validate foreign-key references before each insertion.
//! - Commit the whole batch atomically or roll everything back.
//!
//! # Invariants
//! - Records of equal dependency rank keep their input order (stable sort).
//! - Rows staged earlier in a run are visible to later reference checks:
//!   all reads and writes share one transaction, so SQLite's
//!   transaction-local visibility is a guarantee here, not an accident.
//! - The transaction is closed on every exit path; dropping it on an error
//!   path rolls back before the error is surfaced, and the connection stays
//!   usable afterwards.

use crate::fixture::document::{read_fixture_file, DocumentError, FixtureRecord};
use crate::model::entities::{dependency_rank_for_tag, EntityId, EntityKind};
use crate::repo::store_repo::{RepoError, SqliteStoreRepository, StoreRepository};
use chrono::NaiveDate;
use log::{debug, error, info};
use rusqlite::Connection;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type LoadResult<T> = Result<T, LoadError>;

/// Failure taxonomy for one fixture load run.
///
/// Every variant is fatal to the whole batch; there is no partial success.
#[derive(Debug)]
pub enum LoadError {
    /// A foreign-key field points to a row absent from the transaction.
    Reference {
        kind: EntityKind,
        pk: Option<EntityId>,
        field: &'static str,
        target: EntityKind,
        missing_id: EntityId,
    },
    /// A field is missing or cannot be coerced to its expected shape.
    Format {
        kind: EntityKind,
        pk: Option<EntityId>,
        field: &'static str,
        message: String,
    },
    /// Lower-level database failure, including uniqueness violations.
    Storage(RepoError),
    /// The fixture file could not be read or decoded.
    Document(DocumentError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference {
                kind,
                pk,
                field,
                target,
                missing_id,
            } => write!(
                f,
                "{kind} record pk={} references missing {target} id {missing_id} via `{field}`",
                pk_label(*pk)
            ),
            Self::Format {
                kind,
                pk,
                field,
                message,
            } => write!(
                f,
                "{kind} record pk={} has invalid field `{field}`: {message}",
                pk_label(*pk)
            ),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Reference { .. } | Self::Format { .. } => None,
        }
    }
}

impl From<RepoError> for LoadError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<DocumentError> for LoadError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

/// Reads a fixture file and loads it through [`load_records`].
pub fn load_fixture_file(conn: &mut Connection, path: impl AsRef<Path>) -> LoadResult<usize> {
    let records = read_fixture_file(path)?;
    load_records(conn, &records)
}

/// Loads a fixture document into the bookstore schema in one transaction.
///
/// # Contract
/// - Records are stable-sorted by dependency rank first, so a document may
///   list children before their parents.
/// - Records with unrecognized `model` tags are skipped and excluded from
///   the returned count.
/// - Returns the number of inserted rows on success, after commit.
/// - On the first error the whole batch is rolled back, the failing record
///   is logged with its kind and pk, and the error is surfaced unchanged.
pub fn load_records(conn: &mut Connection, records: &[FixtureRecord]) -> LoadResult<usize> {
    let mut ordered: Vec<&FixtureRecord> = records.iter().collect();
    ordered.sort_by_key(|record| dependency_rank_for_tag(&record.model));

    info!(
        "event=fixture_load module=fixture status=start records={}",
        records.len()
    );

    let tx = conn.transaction().map_err(RepoError::from)?;
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    {
        let repo = SqliteStoreRepository::new(&tx);
        for record in ordered {
            let Some(kind) = EntityKind::parse_model_tag(&record.model) else {
                info!(
                    "event=fixture_skip module=fixture status=ok model={}",
                    record.model
                );
                skipped += 1;
                continue;
            };

            if let Err(err) = stage_record(&repo, kind, record) {
                error!(
                    "event=fixture_load module=fixture status=error kind={kind} pk={} error={err}",
                    pk_label(record.pk)
                );
                // Dropping the transaction here rolls the batch back.
                return Err(err);
            }
            inserted += 1;
        }
    }

    tx.commit().map_err(RepoError::from)?;
    info!("event=fixture_load module=fixture status=ok inserted={inserted} skipped={skipped}");
    Ok(inserted)
}

fn stage_record<R: StoreRepository>(
    repo: &R,
    kind: EntityKind,
    record: &FixtureRecord,
) -> LoadResult<()> {
    let pk = record.pk;
    let fields = &record.fields;

    match kind {
        EntityKind::Publisher => {
            let name = require_str(kind, pk, fields, "name")?;
            repo.insert_publisher(pk, name)?;
        }
        EntityKind::Shop => {
            let name = require_str(kind, pk, fields, "name")?;
            repo.insert_shop(pk, name)?;
        }
        EntityKind::Book => {
            let title = require_str(kind, pk, fields, "title")?;
            let id_publisher = require_id(kind, pk, fields, "id_publisher")?;
            check_reference(repo, kind, pk, "id_publisher", EntityKind::Publisher, id_publisher)?;
            repo.insert_book(pk, title, id_publisher)?;
        }
        EntityKind::Stock => {
            let id_book = require_id(kind, pk, fields, "id_book")?;
            let id_shop = require_id(kind, pk, fields, "id_shop")?;
            check_reference(repo, kind, pk, "id_book", EntityKind::Book, id_book)?;
            check_reference(repo, kind, pk, "id_shop", EntityKind::Shop, id_shop)?;
            let count = require_int(kind, pk, fields, "count")?;
            repo.insert_stock(pk, id_book, id_shop, count)?;
        }
        EntityKind::Sale => {
            let id_stock = require_id(kind, pk, fields, "id_stock")?;
            check_reference(repo, kind, pk, "id_stock", EntityKind::Stock, id_stock)?;
            let price = require_price(kind, pk, fields, "price")?;
            let date_sale = require_date(kind, pk, fields, "date_sale")?;
            repo.insert_sale(pk, id_stock, price, date_sale)?;
        }
    }

    debug!(
        "event=fixture_stage module=fixture status=ok kind={kind} pk={}",
        pk_label(pk)
    );
    Ok(())
}

fn check_reference<R: StoreRepository>(
    repo: &R,
    kind: EntityKind,
    pk: Option<EntityId>,
    field: &'static str,
    target: EntityKind,
    id: EntityId,
) -> LoadResult<()> {
    if repo.row_exists(target, id)? {
        Ok(())
    } else {
        Err(LoadError::Reference {
            kind,
            pk,
            field,
            target,
            missing_id: id,
        })
    }
}

fn require_field<'a>(
    kind: EntityKind,
    pk: Option<EntityId>,
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> LoadResult<&'a Value> {
    fields
        .get(field)
        .ok_or_else(|| format_error(kind, pk, field, "field is missing"))
}

fn require_str<'a>(
    kind: EntityKind,
    pk: Option<EntityId>,
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> LoadResult<&'a str> {
    require_field(kind, pk, fields, field)?
        .as_str()
        .ok_or_else(|| format_error(kind, pk, field, "expected a string"))
}

fn require_id(
    kind: EntityKind,
    pk: Option<EntityId>,
    fields: &Map<String, Value>,
    field: &'static str,
) -> LoadResult<EntityId> {
    require_field(kind, pk, fields, field)?
        .as_i64()
        .ok_or_else(|| format_error(kind, pk, field, "expected an integer id"))
}

fn require_int(
    kind: EntityKind,
    pk: Option<EntityId>,
    fields: &Map<String, Value>,
    field: &'static str,
) -> LoadResult<i64> {
    require_field(kind, pk, fields, field)?
        .as_i64()
        .ok_or_else(|| format_error(kind, pk, field, "expected an integer"))
}

fn require_price(
    kind: EntityKind,
    pk: Option<EntityId>,
    fields: &Map<String, Value>,
    field: &'static str,
) -> LoadResult<f64> {
    let value = require_field(kind, pk, fields, field)?;
    if let Some(number) = value.as_f64() {
        return Ok(number);
    }
    // Decimal prices are often exported as strings to keep precision.
    if let Some(text) = value.as_str() {
        if let Ok(number) = text.parse::<f64>() {
            return Ok(number);
        }
    }
    Err(format_error(kind, pk, field, "expected a decimal price"))
}

fn require_date(
    kind: EntityKind,
    pk: Option<EntityId>,
    fields: &Map<String, Value>,
    field: &'static str,
) -> LoadResult<NaiveDate> {
    let value = require_field(kind, pk, fields, field)?;
    let Some(text) = value.as_str() else {
        return Err(format_error(kind, pk, field, "expected a YYYY-MM-DD string"));
    };
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| {
        format_error(
            kind,
            pk,
            field,
            format!("`{text}` is not a valid YYYY-MM-DD date"),
        )
    })
}

fn format_error(
    kind: EntityKind,
    pk: Option<EntityId>,
    field: &'static str,
    message: impl Into<String>,
) -> LoadError {
    LoadError::Format {
        kind,
        pk,
        field,
        message: message.into(),
    }
}

fn pk_label(pk: Option<EntityId>) -> String {
    pk.map_or_else(|| "auto".to_string(), |id| id.to_string())
}
