//! Query result types.
//!
//! Rows are opaque: decoding a column is deferred to the caller through
//! [`Row::get`], which dispatches to whichever backend produced the row.

use std::fmt;

use sea_orm::QueryResult;
use sqlx::any::AnyRow;

use crate::session::SessionResult;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecOutcome {
    pub fn new(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    /// Number of rows affected by INSERT/UPDATE/DELETE.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Last auto-generated ID, where the backend reports one.
    ///
    /// The sqlx backend reports it for MySQL only. The sea-orm backend
    /// reports it for MySQL and SQLite. Postgres never reports one on
    /// either backend; use `RETURNING` instead.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

enum RowInner {
    Sql(AnyRow),
    Orm(QueryResult),
}

/// A single row returned by a query.
pub struct Row {
    inner: RowInner,
}

impl Row {
    /// Decode the named column.
    pub fn get<T: FromColumn>(&self, column: &str) -> SessionResult<T> {
        match &self.inner {
            RowInner::Sql(row) => T::from_sql_row(row, column),
            RowInner::Orm(row) => T::from_orm_row(row, column),
        }
    }

    /// Name of the backend that produced this row.
    pub fn backend(&self) -> &'static str {
        match self.inner {
            RowInner::Sql(_) => "sqlx",
            RowInner::Orm(_) => "sea-orm",
        }
    }
}

impl From<AnyRow> for Row {
    fn from(row: AnyRow) -> Self {
        Self {
            inner: RowInner::Sql(row),
        }
    }
}

impl From<QueryResult> for Row {
    fn from(row: QueryResult) -> Self {
        Self {
            inner: RowInner::Orm(row),
        }
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}

/// Types that can be decoded from a column of either backend.
pub trait FromColumn: Sized {
    fn from_sql_row(row: &AnyRow, column: &str) -> SessionResult<Self>;
    fn from_orm_row(row: &QueryResult, column: &str) -> SessionResult<Self>;
}

macro_rules! impl_from_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromColumn for $ty {
                fn from_sql_row(row: &AnyRow, column: &str) -> SessionResult<Self> {
                    Ok(sqlx::Row::try_get::<$ty, _>(row, column)?)
                }

                fn from_orm_row(row: &QueryResult, column: &str) -> SessionResult<Self> {
                    Ok(row.try_get::<$ty>("", column)?)
                }
            }
        )*
    };
}

impl_from_column!(
    bool,
    i32,
    i64,
    f64,
    String,
    Vec<u8>,
    Option<bool>,
    Option<i32>,
    Option<i64>,
    Option<f64>,
    Option<String>,
    Option<Vec<u8>>,
);

/// Rows returned from a multi-row query, in database order.
#[derive(Debug, Default)]
pub struct Rows {
    rows: Vec<Row>,
}

impl Rows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Iterate over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl From<Vec<Row>> for Rows {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}
