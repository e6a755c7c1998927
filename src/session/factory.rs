//! Runtime selection of a session from a driver identifier.

use std::future::Future;

use async_trait::async_trait;
use sea_orm::DatabaseTransaction;

use super::config::SessionConfig;
use super::driver::{Client, Driver};
use super::error::{SessionError, SessionResult};
use super::session::{BackendSession, Transactional};
use crate::backend::{Dialect, OrmBackend, SqlBackend, SqlConn};
use crate::query::{ExecOutcome, Param, Row, Rows};
use crate::transaction::{TransactionMetadata, TxHandle};

/// Session over a raw SQL pool.
pub type SqlSession = BackendSession<SqlBackend>;
/// Session over an ORM connection.
pub type OrmSession = BackendSession<OrmBackend>;

/// Live transaction of a [`SqlSession`].
pub type SqlTx = TxHandle<SqlConn>;
/// Live transaction of an [`OrmSession`].
pub type OrmTx = TxHandle<DatabaseTransaction>;

/// A session whose backend was chosen at runtime.
#[derive(Debug, Clone)]
pub enum Session {
    Sql(SqlSession),
    Orm(OrmSession),
}

/// Transaction handle of a [`Session`].
#[derive(Debug, Clone)]
pub enum ActiveTx {
    Sql(SqlTx),
    Orm(OrmTx),
}

impl ActiveTx {
    /// Get the transaction ID.
    pub fn id(&self) -> &str {
        self.metadata().tx_id.as_str()
    }

    pub fn backend(&self) -> &'static str {
        self.metadata().backend
    }

    pub fn metadata(&self) -> &TransactionMetadata {
        match self {
            ActiveTx::Sql(tx) => tx.metadata(),
            ActiveTx::Orm(tx) => tx.metadata(),
        }
    }

    /// Check whether the transaction has not finished yet.
    pub async fn is_active(&self) -> bool {
        match self {
            ActiveTx::Sql(tx) => tx.is_active().await,
            ActiveTx::Orm(tx) => tx.is_active().await,
        }
    }

    fn as_sql(&self) -> SessionResult<&SqlTx> {
        match self {
            ActiveTx::Sql(tx) => Ok(tx),
            ActiveTx::Orm(tx) => Err(SessionError::BackendMismatch {
                expected: "sqlx",
                found: tx.backend(),
            }),
        }
    }

    fn as_orm(&self) -> SessionResult<&OrmTx> {
        match self {
            ActiveTx::Orm(tx) => Ok(tx),
            ActiveTx::Sql(tx) => Err(SessionError::BackendMismatch {
                expected: "sea-orm",
                found: tx.backend(),
            }),
        }
    }
}

impl Session {
    /// Create a session for `driver` bound to `client`.
    ///
    /// # Panics
    ///
    /// Panics if the driver identifier is not recognized, if the client
    /// kind does not match the driver, or if the configuration is invalid.
    /// Use [`Session::try_new`] to handle these as errors.
    pub fn new(driver: &str, client: Client, config: SessionConfig) -> Self {
        match Self::try_new(driver, client, config) {
            Ok(session) => session,
            Err(err) => panic!("{}", err),
        }
    }

    /// Create a session for `driver` bound to `client`.
    pub fn try_new(driver: &str, client: Client, config: SessionConfig) -> SessionResult<Self> {
        let parsed: Driver = driver.parse()?;
        config.validate()?;

        match (parsed.dialect(), client) {
            (Some(dialect), Client::Sql(pool)) => {
                // The declared driver must name the database the pool actually talks to.
                let actual = Dialect::of_pool(&pool);
                if actual != Some(dialect) {
                    return Err(SessionError::ClientMismatch {
                        driver: driver.to_string(),
                        expected: dialect.name(),
                        found: actual.map_or("unknown", |d| d.name()),
                    });
                }
                Ok(Session::Sql(BackendSession::new(
                    SqlBackend::new(pool, dialect),
                    config,
                )))
            }
            (None, Client::Orm(db)) => {
                Ok(Session::Orm(BackendSession::new(OrmBackend::new(db), config)))
            }
            (_, client) => Err(SessionError::ClientMismatch {
                driver: driver.to_string(),
                expected: parsed.client_kind(),
                found: client.kind(),
            }),
        }
    }

    /// Name of the backend in use, `"sqlx"` or `"sea-orm"`.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Session::Sql(_) => "sqlx",
            Session::Orm(_) => "sea-orm",
        }
    }

    pub fn config(&self) -> &SessionConfig {
        match self {
            Session::Sql(session) => session.config(),
            Session::Orm(session) => session.config(),
        }
    }

    /// Get the number of open transactions.
    pub fn active_count(&self) -> usize {
        match self {
            Session::Sql(session) => session.active_count(),
            Session::Orm(session) => session.active_count(),
        }
    }

    /// List open transaction IDs.
    pub fn active_transactions(&self) -> Vec<String> {
        match self {
            Session::Sql(session) => session.active_transactions(),
            Session::Orm(session) => session.active_transactions(),
        }
    }
}

#[async_trait]
impl Transactional for Session {
    type Tx = ActiveTx;

    async fn transaction<T, E, F, Fut>(&self, work: F) -> Result<T, E>
    where
        T: Send,
        E: From<SessionError> + Send,
        F: FnOnce(Self::Tx) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        match self {
            Session::Sql(session) => session.transaction(move |tx| work(ActiveTx::Sql(tx))).await,
            Session::Orm(session) => session.transaction(move |tx| work(ActiveTx::Orm(tx))).await,
        }
    }

    async fn exec_query(
        &self,
        tx: Option<&ActiveTx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<ExecOutcome> {
        match self {
            Session::Sql(session) => {
                let tx = tx.map(ActiveTx::as_sql).transpose()?;
                session.exec_query(tx, query, params).await
            }
            Session::Orm(session) => {
                let tx = tx.map(ActiveTx::as_orm).transpose()?;
                session.exec_query(tx, query, params).await
            }
        }
    }

    async fn query_row(
        &self,
        tx: Option<&ActiveTx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Option<Row>> {
        match self {
            Session::Sql(session) => {
                let tx = tx.map(ActiveTx::as_sql).transpose()?;
                session.query_row(tx, query, params).await
            }
            Session::Orm(session) => {
                let tx = tx.map(ActiveTx::as_orm).transpose()?;
                session.query_row(tx, query, params).await
            }
        }
    }

    async fn query_rows(
        &self,
        tx: Option<&ActiveTx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Rows> {
        match self {
            Session::Sql(session) => {
                let tx = tx.map(ActiveTx::as_sql).transpose()?;
                session.query_rows(tx, query, params).await
            }
            Session::Orm(session) => {
                let tx = tx.map(ActiveTx::as_orm).transpose()?;
                session.query_rows(tx, query, params).await
            }
        }
    }
}
