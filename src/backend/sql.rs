//! Raw SQL backend using sqlx's `Any` driver.
//!
//! Transactions are driven with plain SQL on a dedicated pooled
//! connection so that isolation level and access mode reach the database
//! exactly as configured, in the spelling each database expects.

use async_trait::async_trait;
use sqlx::any::AnyArguments;
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, AnyPool, Executor};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::query::{ExecOutcome, Param, ParamType, Row};
use crate::session::{SessionError, SessionResult};
use crate::transaction::TransactionOptions;

/// SQL dialect behind an `AnyPool`, fixed by the session's driver identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Dialect for a database URL scheme.
    pub fn from_scheme(scheme: &str) -> Option<Dialect> {
        match scheme {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    /// Dialect of the database a pool is connected to.
    pub fn of_pool(pool: &AnyPool) -> Option<Dialect> {
        Self::from_scheme(pool.connect_options().database_url.scheme())
    }

    /// Statements that open a transaction with the given options.
    pub fn begin_statements(&self, options: &TransactionOptions) -> Vec<String> {
        match (self, options.characteristics()) {
            (Dialect::Postgres, Some(characteristics)) => {
                vec![format!("BEGIN {}", characteristics)]
            }
            // MySQL only accepts the isolation level ahead of the transaction.
            (Dialect::MySql, Some(characteristics)) => vec![
                format!("SET TRANSACTION {}", characteristics),
                "START TRANSACTION".to_string(),
            ],
            _ => vec!["BEGIN".to_string()],
        }
    }
}

/// A pooled connection with an open transaction.
///
/// If it is dropped before commit or rollback finished cleanly, the
/// connection is detached from the pool and closed instead of being
/// handed to the next caller mid-transaction.
pub struct SqlConn {
    conn: Option<PoolConnection<Any>>,
    open: bool,
}

impl SqlConn {
    fn new(conn: PoolConnection<Any>) -> Self {
        Self {
            conn: Some(conn),
            open: true,
        }
    }

    fn connection(&mut self) -> SessionResult<&mut AnyConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| SessionError::Internal("transaction connection already released".into()))
    }

    async fn finish(mut self, statement: &str) -> SessionResult<()> {
        self.connection()?.execute(statement).await?;
        self.open = false;
        Ok(())
    }
}

impl Drop for SqlConn {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if let Some(conn) = self.conn.take() {
            warn!("closing connection left with an unfinished transaction");
            drop(conn.detach());
        }
    }
}

/// Backend over a sqlx `AnyPool`.
#[derive(Debug, Clone)]
pub struct SqlBackend {
    pool: AnyPool,
    dialect: Dialect,
}

impl SqlBackend {
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self { pool, dialect }
    }

    /// Get the underlying pool for direct use.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

fn bind_params<'q>(query: &'q str, params: &[Param]) -> Query<'q, Any, AnyArguments<'q>> {
    params
        .iter()
        .fold(sqlx::query(query), |statement, param| match param {
            Param::Null | Param::TypedNull(ParamType::Text) => statement.bind(None::<String>),
            Param::TypedNull(ParamType::Bool) => statement.bind(None::<bool>),
            Param::TypedNull(ParamType::Int) => statement.bind(None::<i64>),
            Param::TypedNull(ParamType::Float) => statement.bind(None::<f64>),
            Param::TypedNull(ParamType::Bytes) => statement.bind(None::<Vec<u8>>),
            Param::Bool(v) => statement.bind(*v),
            Param::Int(v) => statement.bind(*v),
            Param::Float(v) => statement.bind(*v),
            Param::Text(v) => statement.bind(v.clone()),
            Param::Bytes(v) => statement.bind(v.clone()),
        })
}

#[async_trait]
impl Backend for SqlBackend {
    type Conn = SqlConn;

    fn name(&self) -> &'static str {
        "sqlx"
    }

    async fn begin(&self, options: &TransactionOptions) -> SessionResult<SqlConn> {
        if self.dialect == Dialect::Sqlite && !options.is_default() {
            debug!(?options, "sqlite ignores transaction isolation and access mode");
        }

        let mut conn = SqlConn::new(self.pool.acquire().await?);
        for statement in self.dialect.begin_statements(options) {
            conn.connection()?.execute(statement.as_str()).await?;
        }
        Ok(conn)
    }

    async fn commit(&self, conn: SqlConn) -> SessionResult<()> {
        conn.finish("COMMIT").await
    }

    async fn rollback(&self, conn: SqlConn) -> SessionResult<()> {
        conn.finish("ROLLBACK").await
    }

    async fn execute(
        &self,
        conn: Option<&mut SqlConn>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<ExecOutcome> {
        let statement = bind_params(query, params);
        let result = match conn {
            Some(conn) => statement.execute(conn.connection()?).await?,
            None => statement.execute(&self.pool).await?,
        };
        Ok(ExecOutcome::new(result.rows_affected(), result.last_insert_id()))
    }

    async fn fetch_optional(
        &self,
        conn: Option<&mut SqlConn>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Option<Row>> {
        let statement = bind_params(query, params);
        let row = match conn {
            Some(conn) => statement.fetch_optional(conn.connection()?).await?,
            None => statement.fetch_optional(&self.pool).await?,
        };
        Ok(row.map(Row::from))
    }

    async fn fetch_all(
        &self,
        conn: Option<&mut SqlConn>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Vec<Row>> {
        let statement = bind_params(query, params);
        let rows = match conn {
            Some(conn) => statement.fetch_all(conn.connection()?).await?,
            None => statement.fetch_all(&self.pool).await?,
        };
        Ok(rows.into_iter().map(Row::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use crate::session::{Session, Transactional};
    use crate::test_support::{read_x, seeded_session};
    use crate::transaction::IsolationLevel;

    #[test]
    fn test_begin_statements() {
        let defaults = TransactionOptions::default();
        assert_eq!(Dialect::Postgres.begin_statements(&defaults), vec!["BEGIN"]);
        assert_eq!(Dialect::MySql.begin_statements(&defaults), vec!["BEGIN"]);

        let options = TransactionOptions::new()
            .isolation(IsolationLevel::Serializable)
            .read_only(true);
        assert_eq!(
            Dialect::Postgres.begin_statements(&options),
            vec!["BEGIN ISOLATION LEVEL SERIALIZABLE, READ ONLY"]
        );
        assert_eq!(
            Dialect::MySql.begin_statements(&options),
            vec![
                "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE, READ ONLY",
                "START TRANSACTION"
            ]
        );
        assert_eq!(Dialect::Sqlite.begin_statements(&options), vec!["BEGIN"]);
    }

    #[test]
    fn test_dialect_from_scheme() {
        assert_eq!(Dialect::from_scheme("postgresql"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_scheme("mariadb"), Some(Dialect::MySql));
        assert_eq!(Dialect::from_scheme("sqlite"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_scheme("mssql"), None);
        assert_eq!(Dialect::MySql.name(), "mysql");
    }

    #[tokio::test]
    async fn test_dialect_of_pool() {
        let (_dir, session) = seeded_session("sqlite").await;
        let Session::Sql(sql) = &session else {
            panic!("expected sqlx session");
        };
        assert_eq!(Dialect::of_pool(sql.backend().pool()), Some(Dialect::Sqlite));
    }

    #[tokio::test]
    async fn test_exec_outcome() {
        let (_dir, session) = seeded_session("sqlite").await;

        let outcome = session
            .exec_query(
                None,
                "INSERT INTO t (id, x, label) VALUES (?, ?, ?)",
                &params![10, 5, "tenth"],
            )
            .await
            .unwrap();
        assert_eq!(outcome.rows_affected(), 1);
        // The Any driver only carries an insert id for MySQL.
        assert_eq!(outcome.last_insert_id(), None);

        let outcome = session
            .exec_query(None, "UPDATE t SET x = x + 1", &[])
            .await
            .unwrap();
        assert_eq!(outcome.rows_affected(), 3);
    }

    #[tokio::test]
    async fn test_rows_decode() {
        let (_dir, session) = seeded_session("sqlite").await;

        let rows = session
            .query_rows(None, "SELECT id, label FROM t ORDER BY id", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let labels: Vec<String> = rows
            .iter()
            .map(|row| row.get::<String>("label").unwrap())
            .collect();
        assert_eq!(labels, vec!["first", "second"]);
        assert_eq!(rows.get(0).unwrap().backend(), "sqlx");

        let missing = session
            .query_row(None, "SELECT x FROM t WHERE id = ?", &params![99])
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_null_param() {
        let (_dir, session) = seeded_session("sqlite").await;

        session
            .exec_query(
                None,
                "UPDATE t SET label = ? WHERE id = ?",
                &params![None::<String>, 1],
            )
            .await
            .unwrap();

        let row = session
            .query_row(None, "SELECT label FROM t WHERE id = 1", &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get::<Option<String>>("label").unwrap(), None);
    }

    #[tokio::test]
    async fn test_dropped_transaction_does_not_leak() {
        let (_dir, session) = seeded_session("sqlite").await;
        let Session::Sql(sql) = &session else {
            panic!("expected sqlx session");
        };

        let mut conn = sql.backend().begin(&TransactionOptions::default()).await.unwrap();
        sql.backend()
            .execute(Some(&mut conn), "UPDATE t SET x = 42 WHERE id = 1", &[])
            .await
            .unwrap();
        drop(conn);

        assert_eq!(read_x(&session, None, 1).await, 0);
    }
}
