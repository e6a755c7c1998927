//! Persistence backends.
//!
//! A [`Backend`] exposes the handful of primitives a session needs:
//! begin/commit/rollback of a live transaction, and statement execution
//! either on that transaction or directly on the client. The transaction
//! algorithm itself lives in the session and is identical for every
//! backend.
//!
//! - [`SqlBackend`]: raw SQL through a sqlx `AnyPool` (Postgres, MySQL, SQLite)
//! - [`OrmBackend`]: SeaORM `DatabaseConnection`

use async_trait::async_trait;

use crate::query::{ExecOutcome, Param, Row};
use crate::session::SessionResult;
use crate::transaction::TransactionOptions;

mod orm;
mod sql;

#[cfg(test)]
pub(crate) mod mock;

pub use orm::OrmBackend;
pub use sql::{Dialect, SqlBackend, SqlConn};

/// Transaction and statement primitives of one persistence client.
///
/// Every statement method takes `conn`: `Some` runs the statement inside
/// that live transaction, `None` runs it on the client with the client's
/// own auto-commit behaviour.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// A live transaction.
    type Conn: Send + 'static;

    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Begin a transaction with the given options.
    async fn begin(&self, options: &TransactionOptions) -> SessionResult<Self::Conn>;

    /// Commit a live transaction.
    async fn commit(&self, conn: Self::Conn) -> SessionResult<()>;

    /// Roll back a live transaction.
    async fn rollback(&self, conn: Self::Conn) -> SessionResult<()>;

    /// Execute a write statement.
    async fn execute(
        &self,
        conn: Option<&mut Self::Conn>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<ExecOutcome>;

    /// Fetch at most one row.
    async fn fetch_optional(
        &self,
        conn: Option<&mut Self::Conn>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Option<Row>>;

    /// Fetch every row.
    async fn fetch_all(
        &self,
        conn: Option<&mut Self::Conn>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Vec<Row>>;
}
