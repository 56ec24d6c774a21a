//! Shared repository error type and the SQLite catalog handle.
//!
//! # Responsibility
//! - Own the connection handle that both book and review contracts run on.
//! - Refuse connections whose schema is not fully migrated.
//!
//! # Invariants
//! - A `SqliteCatalogRepository` only exists for a connection at the latest
//!   schema version with every required table and column present.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::book::BookId;
use crate::model::review::ReviewId;
use crate::model::validation::ValidationErrors;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Candidate state breaks one or more field rules.
    Validation(ValidationErrors),
    BookNotFound(BookId),
    ReviewNotFound(ReviewId),
    /// Book delete left reviews behind; the delete was rolled back.
    CascadeIncomplete { book_id: BookId, remaining: i64 },
    Db(DbError),
    /// Persisted rows cannot be converted to valid entities.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::BookNotFound(_) => "book_not_found",
            Self::ReviewNotFound(_) => "review_not_found",
            Self::CascadeIncomplete { .. } => "cascade_incomplete",
            Self::Db(_) => "db_error",
            Self::InvalidData(_) => "invalid_data",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BookNotFound(_) | Self::ReviewNotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::ReviewNotFound(id) => write!(f, "review not found: {id}"),
            Self::CascadeIncomplete { book_id, remaining } => write!(
                f,
                "deleting book {book_id} left {remaining} review(s) behind; delete rolled back"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
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

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "books",
        &[
            "id",
            "title",
            "author",
            "published_year",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "reviews",
        &[
            "id",
            "book_id",
            "rating",
            "comment",
            "created_at",
            "updated_at",
        ],
    ),
];

/// SQLite-backed Book/Review aggregate repository.
///
/// Implements both [`BookRepository`](crate::repo::book_repo::BookRepository)
/// and [`ReviewRepository`](crate::repo::review_repo::ReviewRepository).
pub struct SqliteCatalogRepository<'conn> {
    pub(crate) conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Starts a write transaction that takes the database write lock up front.
    pub(crate) fn begin_immediate(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

fn ensure_catalog_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        let present = table_columns(conn, table)?;
        if let Some(column) = columns
            .iter()
            .copied()
            .find(|column| !present.iter().any(|name| name.as_str() == *column))
        {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
