//! The transaction algorithm, shared by every backend.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::config::SessionConfig;
use super::error::{SessionError, SessionResult};
use crate::backend::Backend;
use crate::query::{ExecOutcome, Param, Row, Rows};
use crate::transaction::{TransactionRegistry, TxHandle};

/// Capabilities of a transactional session.
///
/// Query operations take the transaction handle explicitly: `Some(tx)`
/// runs the statement inside that transaction, `None` runs it on the
/// session's client.
#[async_trait]
pub trait Transactional: Send + Sync {
    /// Handle passed to the work of a transaction.
    type Tx: Clone + Send + Sync + 'static;

    /// Run `work` inside a transaction.
    ///
    /// Commits if `work` succeeds and rolls back if it fails. A failure to
    /// begin is returned without calling `work`. Rollback failures are
    /// logged and discarded in favour of the work's own error; commit
    /// failures are returned.
    async fn transaction<T, E, F, Fut>(&self, work: F) -> Result<T, E>
    where
        T: Send,
        E: From<SessionError> + Send,
        F: FnOnce(Self::Tx) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send;

    /// Execute a statement that returns no rows.
    async fn exec_query(
        &self,
        tx: Option<&Self::Tx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<ExecOutcome>;

    /// Fetch the first row of a query, if any.
    async fn query_row(
        &self,
        tx: Option<&Self::Tx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Option<Row>>;

    /// Fetch every row of a query.
    async fn query_rows(
        &self,
        tx: Option<&Self::Tx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Rows>;
}

struct SessionInner<B> {
    backend: B,
    config: SessionConfig,
    registry: TransactionRegistry,
}

/// A session over one backend.
pub struct BackendSession<B: Backend> {
    inner: Arc<SessionInner<B>>,
}

impl<B: Backend> BackendSession<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                backend,
                config,
                registry: TransactionRegistry::new(),
            }),
        }
    }

    /// Get the backend.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Get the number of transactions currently open on this session.
    pub fn active_count(&self) -> usize {
        self.inner.registry.active_count()
    }

    /// List the IDs of transactions currently open on this session.
    pub fn active_transactions(&self) -> Vec<String> {
        self.inner.registry.active_transactions()
    }

    async fn run<T, E, Fut>(&self, handle: &TxHandle<B::Conn>, work: Fut) -> Result<T, E>
    where
        E: From<SessionError>,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(limit) = self.inner.config.transaction_timeout() else {
            return work.await;
        };
        match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = handle.metadata().elapsed_ms();
                warn!(tx_id = handle.id(), elapsed_ms, "transaction timed out");
                Err(E::from(SessionError::Timeout {
                    tx_id: handle.id().to_string(),
                    elapsed_ms,
                }))
            }
        }
    }
}

impl<B: Backend> Clone for BackendSession<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for BackendSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSession")
            .field("backend", &self.inner.backend.name())
            .field("config", &self.inner.config)
            .field("active", &self.active_count())
            .finish()
    }
}

#[async_trait]
impl<B: Backend> Transactional for BackendSession<B> {
    type Tx = TxHandle<B::Conn>;

    async fn transaction<T, E, F, Fut>(&self, work: F) -> Result<T, E>
    where
        T: Send,
        E: From<SessionError> + Send,
        F: FnOnce(Self::Tx) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let backend = &self.inner.backend;
        let options = self.inner.config.options;

        let conn = match backend.begin(&options).await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(backend = backend.name(), error = %err, "failed to begin transaction");
                return Err(E::from(err));
            }
        };

        let handle = TxHandle::new(conn, backend.name(), options);
        let _registration = self.inner.registry.register(handle.metadata());
        debug!(tx_id = handle.id(), backend = backend.name(), ?options, "transaction started");

        let result = self.run(&handle, work(handle.clone())).await;

        let Some(conn) = handle.close().await else {
            return Err(E::from(SessionError::Internal(format!(
                "transaction {} was closed while its work was running",
                handle.id()
            ))));
        };
        let elapsed_ms = handle.metadata().elapsed_ms();

        match result {
            Ok(value) => {
                if let Err(err) = backend.commit(conn).await {
                    warn!(tx_id = handle.id(), elapsed_ms, error = %err, "commit failed");
                    return Err(E::from(err));
                }
                debug!(tx_id = handle.id(), elapsed_ms, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = backend.rollback(conn).await {
                    warn!(
                        tx_id = handle.id(),
                        error = %rollback_err,
                        "rollback failed, returning the work error"
                    );
                }
                debug!(tx_id = handle.id(), elapsed_ms, "transaction rolled back");
                Err(err)
            }
        }
    }

    async fn exec_query(
        &self,
        tx: Option<&Self::Tx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<ExecOutcome> {
        let backend = &self.inner.backend;
        match tx {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or_else(|| tx.not_active())?;
                backend.execute(Some(conn), query, params).await
            }
            None => backend.execute(None, query, params).await,
        }
    }

    async fn query_row(
        &self,
        tx: Option<&Self::Tx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Option<Row>> {
        let backend = &self.inner.backend;
        match tx {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or_else(|| tx.not_active())?;
                backend.fetch_optional(Some(conn), query, params).await
            }
            None => backend.fetch_optional(None, query, params).await,
        }
    }

    async fn query_rows(
        &self,
        tx: Option<&Self::Tx>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Rows> {
        let backend = &self.inner.backend;
        let rows = match tx {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or_else(|| tx.not_active())?;
                backend.fetch_all(Some(conn), query, params).await?
            }
            None => backend.fetch_all(None, query, params).await?,
        };
        Ok(Rows::from(rows))
    }
}
