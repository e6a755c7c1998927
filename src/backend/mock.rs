//! Recording backend for session tests.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::Backend;
use crate::query::{ExecOutcome, Param, Row};
use crate::session::{SessionError, SessionResult};
use crate::transaction::TransactionOptions;

/// Records every primitive call as a string, e.g. `begin`, `exec:tx1:UPDATE t`.
#[derive(Debug, Default)]
pub(crate) struct MockBackend {
    pub(crate) events: Mutex<Vec<String>>,
    pub(crate) next_tx: AtomicU32,
    pub(crate) fail_begin: bool,
    pub(crate) fail_commit: bool,
    pub(crate) fail_rollback: bool,
}

impl MockBackend {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }

    fn target(conn: Option<&mut u32>) -> String {
        match conn {
            Some(id) => format!("tx{}", id),
            None => "client".to_string(),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    type Conn = u32;

    fn name(&self) -> &'static str {
        "mock"
    }

    async fn begin(&self, _options: &TransactionOptions) -> SessionResult<u32> {
        self.record("begin".into());
        if self.fail_begin {
            return Err(SessionError::Internal("begin refused".into()));
        }
        Ok(self.next_tx.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn commit(&self, conn: u32) -> SessionResult<()> {
        self.record(format!("commit:tx{}", conn));
        if self.fail_commit {
            return Err(SessionError::Internal("commit refused".into()));
        }
        Ok(())
    }

    async fn rollback(&self, conn: u32) -> SessionResult<()> {
        self.record(format!("rollback:tx{}", conn));
        if self.fail_rollback {
            return Err(SessionError::Internal("rollback refused".into()));
        }
        Ok(())
    }

    async fn execute(
        &self,
        conn: Option<&mut u32>,
        query: &str,
        _params: &[Param],
    ) -> SessionResult<ExecOutcome> {
        self.record(format!("exec:{}:{}", Self::target(conn), query));
        Ok(ExecOutcome::new(1, None))
    }

    async fn fetch_optional(
        &self,
        conn: Option<&mut u32>,
        query: &str,
        _params: &[Param],
    ) -> SessionResult<Option<Row>> {
        self.record(format!("row:{}:{}", Self::target(conn), query));
        Ok(None)
    }

    async fn fetch_all(
        &self,
        conn: Option<&mut u32>,
        query: &str,
        _params: &[Param],
    ) -> SessionResult<Vec<Row>> {
        self.record(format!("rows:{}:{}", Self::target(conn), query));
        Ok(Vec::new())
    }
}
