//! Bookstore repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Stage fixture rows and probe row existence for reference checks.
//! - Read entities back and run the per-publisher sales report.
//!
//! # Invariants
//! - Insert APIs accept caller-supplied ids and fall back to SQLite rowid
//!   assignment when the id is absent.
//! - When constructed over a transaction, reads see rows staged earlier in
//!   that transaction.

use crate::db::DbError;
use crate::model::entities::{Book, EntityId, EntityKind, Publisher, Sale, Shop, Stock};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for bookstore persistence and report queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    PublisherNotFound(PublisherRef),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::PublisherNotFound(publisher) => {
                write!(f, "publisher not found: {publisher}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::PublisherNotFound(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Publisher lookup key for report queries: exact id, or case-insensitive
/// name substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherRef {
    Id(EntityId),
    Name(String),
}

impl Display for PublisherRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name `{name}`"),
        }
    }
}

/// One row of the per-publisher sales report: which book sold where, for
/// how much, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherSaleRow {
    pub book_title: String,
    pub shop_name: String,
    pub price: f64,
    pub date_sale: NaiveDate,
}

/// Data access contract for the bookstore tables.
pub trait StoreRepository {
    /// Returns whether a row of `kind` with the given id is visible.
    fn row_exists(&self, kind: EntityKind, id: EntityId) -> RepoResult<bool>;

    fn insert_publisher(&self, id: Option<EntityId>, name: &str) -> RepoResult<EntityId>;
    fn insert_shop(&self, id: Option<EntityId>, name: &str) -> RepoResult<EntityId>;
    fn insert_book(
        &self,
        id: Option<EntityId>,
        title: &str,
        id_publisher: EntityId,
    ) -> RepoResult<EntityId>;
    fn insert_stock(
        &self,
        id: Option<EntityId>,
        id_book: EntityId,
        id_shop: EntityId,
        count: i64,
    ) -> RepoResult<EntityId>;
    fn insert_sale(
        &self,
        id: Option<EntityId>,
        id_stock: EntityId,
        price: f64,
        date_sale: NaiveDate,
    ) -> RepoResult<EntityId>;

    fn get_publisher(&self, id: EntityId) -> RepoResult<Option<Publisher>>;
    fn get_shop(&self, id: EntityId) -> RepoResult<Option<Shop>>;
    fn get_book(&self, id: EntityId) -> RepoResult<Option<Book>>;
    fn get_stock(&self, id: EntityId) -> RepoResult<Option<Stock>>;
    fn get_sale(&self, id: EntityId) -> RepoResult<Option<Sale>>;

    /// Finds one publisher by id or name substring.
    fn find_publisher(&self, publisher: &PublisherRef) -> RepoResult<Option<Publisher>>;

    /// Sales report for one publisher, newest sale first.
    ///
    /// Fails with [`RepoError::PublisherNotFound`] when the lookup key does
    /// not resolve.
    fn sales_by_publisher(&self, publisher: &PublisherRef) -> RepoResult<Vec<PublisherSaleRow>>;
}

/// SQLite-backed bookstore repository.
///
/// Accepts either a plain connection or a transaction (via deref), which is
/// how the fixture loader gets stage-then-see-your-own-writes visibility.
pub struct SqliteStoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoreRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn effective_id(&self, supplied: Option<EntityId>) -> EntityId {
        supplied.unwrap_or_else(|| self.conn.last_insert_rowid())
    }
}

impl StoreRepository for SqliteStoreRepository<'_> {
    fn row_exists(&self, kind: EntityKind, id: EntityId) -> RepoResult<bool> {
        let sql = match kind {
            EntityKind::Publisher => "SELECT EXISTS(SELECT 1 FROM publishers WHERE id = ?1);",
            EntityKind::Shop => "SELECT EXISTS(SELECT 1 FROM shops WHERE id = ?1);",
            EntityKind::Book => "SELECT EXISTS(SELECT 1 FROM books WHERE id = ?1);",
            EntityKind::Stock => "SELECT EXISTS(SELECT 1 FROM stocks WHERE id = ?1);",
            EntityKind::Sale => "SELECT EXISTS(SELECT 1 FROM sales WHERE id = ?1);",
        };
        let exists: i64 = self.conn.query_row(sql, [id], |row| row.get(0))?;
        Ok(exists == 1)
    }

    fn insert_publisher(&self, id: Option<EntityId>, name: &str) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO publishers (id, name) VALUES (?1, ?2);",
            params![id, name],
        )?;
        Ok(self.effective_id(id))
    }

    fn insert_shop(&self, id: Option<EntityId>, name: &str) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO shops (id, name) VALUES (?1, ?2);",
            params![id, name],
        )?;
        Ok(self.effective_id(id))
    }

    fn insert_book(
        &self,
        id: Option<EntityId>,
        title: &str,
        id_publisher: EntityId,
    ) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO books (id, title, id_publisher) VALUES (?1, ?2, ?3);",
            params![id, title, id_publisher],
        )?;
        Ok(self.effective_id(id))
    }

    fn insert_stock(
        &self,
        id: Option<EntityId>,
        id_book: EntityId,
        id_shop: EntityId,
        count: i64,
    ) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO stocks (id, id_book, id_shop, count) VALUES (?1, ?2, ?3, ?4);",
            params![id, id_book, id_shop, count],
        )?;
        Ok(self.effective_id(id))
    }

    fn insert_sale(
        &self,
        id: Option<EntityId>,
        id_stock: EntityId,
        price: f64,
        date_sale: NaiveDate,
    ) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO sales (id, id_stock, price, date_sale) VALUES (?1, ?2, ?3, ?4);",
            params![id, id_stock, price, date_sale],
        )?;
        Ok(self.effective_id(id))
    }

    fn get_publisher(&self, id: EntityId) -> RepoResult<Option<Publisher>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM publishers WHERE id = ?1;",
                [id],
                parse_publisher_row,
            )
            .optional()?;
        Ok(row)
    }

    fn get_shop(&self, id: EntityId) -> RepoResult<Option<Shop>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM shops WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Shop {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn get_book(&self, id: EntityId) -> RepoResult<Option<Book>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, id_publisher FROM books WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Book {
                        id: row.get("id")?,
                        title: row.get("title")?,
                        id_publisher: row.get("id_publisher")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn get_stock(&self, id: EntityId) -> RepoResult<Option<Stock>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, id_book, id_shop, count FROM stocks WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Stock {
                        id: row.get("id")?,
                        id_book: row.get("id_book")?,
                        id_shop: row.get("id_shop")?,
                        count: row.get("count")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn get_sale(&self, id: EntityId) -> RepoResult<Option<Sale>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, id_stock, price, date_sale FROM sales WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Sale {
                        id: row.get("id")?,
                        id_stock: row.get("id_stock")?,
                        price: row.get("price")?,
                        date_sale: row.get("date_sale")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn find_publisher(&self, publisher: &PublisherRef) -> RepoResult<Option<Publisher>> {
        let found = match publisher {
            PublisherRef::Id(id) => self.get_publisher(*id)?,
            PublisherRef::Name(name) => self
                .conn
                .query_row(
                    "SELECT id, name FROM publishers
                     WHERE name LIKE '%' || ?1 || '%'
                     ORDER BY id
                     LIMIT 1;",
                    [name.as_str()],
                    parse_publisher_row,
                )
                .optional()?,
        };
        Ok(found)
    }

    fn sales_by_publisher(&self, publisher: &PublisherRef) -> RepoResult<Vec<PublisherSaleRow>> {
        let Some(found) = self.find_publisher(publisher)? else {
            return Err(RepoError::PublisherNotFound(publisher.clone()));
        };

        let mut stmt = self.conn.prepare(
            "SELECT
                b.title AS book_title,
                sh.name AS shop_name,
                sa.price,
                sa.date_sale
             FROM sales sa
             INNER JOIN stocks st ON st.id = sa.id_stock
             INNER JOIN books b ON b.id = st.id_book
             INNER JOIN shops sh ON sh.id = st.id_shop
             WHERE b.id_publisher = ?1
             ORDER BY sa.date_sale DESC, sa.id ASC;",
        )?;

        let mut rows = stmt.query([found.id])?;
        let mut report = Vec::new();
        while let Some(row) = rows.next()? {
            report.push(PublisherSaleRow {
                book_title: row.get("book_title")?,
                shop_name: row.get("shop_name")?,
                price: row.get("price")?,
                date_sale: row.get("date_sale")?,
            });
        }

        Ok(report)
    }
}

fn parse_publisher_row(row: &Row<'_>) -> rusqlite::Result<Publisher> {
    Ok(Publisher {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}
