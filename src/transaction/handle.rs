//! Live transaction handles.
//!
//! A [`TxHandle`] is what a session passes to the caller's work and what
//! the caller passes back to query operations. Clones share one live
//! transaction; once the session commits or rolls back, every clone
//! reports the transaction as no longer active.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use ulid::Ulid;

use crate::session::SessionError;
use crate::transaction::isolation::TransactionOptions;

/// Transaction metadata, shared by all clones of a handle.
#[derive(Debug, Clone)]
pub struct TransactionMetadata {
    /// Unique transaction ID (lowercase ULID).
    pub tx_id: String,
    /// Name of the backend that owns the transaction.
    pub backend: &'static str,
    /// Options the transaction was started with.
    pub options: TransactionOptions,
    /// When the transaction started.
    pub started_at: DateTime<Utc>,
}

impl TransactionMetadata {
    fn new(backend: &'static str, options: TransactionOptions) -> Self {
        Self {
            tx_id: Ulid::new().to_string().to_lowercase(),
            backend,
            options,
            started_at: Utc::now(),
        }
    }

    /// Milliseconds since the transaction started.
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        u64::try_from(elapsed.num_milliseconds()).unwrap_or(0)
    }
}

/// Handle to an in-flight transaction of backend connection type `C`.
pub struct TxHandle<C> {
    metadata: Arc<TransactionMetadata>,
    conn: Arc<Mutex<Option<C>>>,
}

impl<C> TxHandle<C> {
    pub(crate) fn new(conn: C, backend: &'static str, options: TransactionOptions) -> Self {
        Self {
            metadata: Arc::new(TransactionMetadata::new(backend, options)),
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// Get the transaction ID.
    pub fn id(&self) -> &str {
        &self.metadata.tx_id
    }

    /// Get the transaction metadata.
    pub fn metadata(&self) -> &TransactionMetadata {
        &self.metadata
    }

    /// Name of the backend this handle belongs to.
    pub fn backend(&self) -> &'static str {
        self.metadata.backend
    }

    /// Check whether the transaction has not been committed or rolled back yet.
    pub async fn is_active(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Lock the live transaction for one operation.
    ///
    /// The guard holds `None` once the transaction has finished.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<C>> {
        self.conn.lock().await
    }

    /// Detach the live transaction so it can be committed or rolled back.
    pub(crate) async fn close(&self) -> Option<C> {
        self.conn.lock().await.take()
    }

    pub(crate) fn not_active(&self) -> SessionError {
        SessionError::NotActive {
            tx_id: self.metadata.tx_id.clone(),
        }
    }
}

impl<C> Clone for TxHandle<C> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            conn: Arc::clone(&self.conn),
        }
    }
}

impl<C> fmt::Debug for TxHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxHandle")
            .field("tx_id", &self.metadata.tx_id)
            .field("backend", &self.metadata.backend)
            .finish_non_exhaustive()
    }
}
