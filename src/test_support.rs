//! Shared fixtures for tests against throwaway SQLite databases.

use tempfile::TempDir;

use crate::params;
use crate::session::{ActiveTx, Client, Driver, Session, SessionConfig, Transactional};

/// Connect a client of `driver`'s kind to a fresh SQLite file.
pub(crate) async fn sqlite_client(driver: Driver) -> (TempDir, Client) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let client = Client::connect(driver, &url).await.unwrap();
    (dir, client)
}

/// Session over a fresh database holding table `t` with rows 1 and 2, both `x = 0`.
pub(crate) async fn seeded_session(driver: &str) -> (TempDir, Session) {
    seeded_session_with(driver, SessionConfig::default()).await
}

pub(crate) async fn seeded_session_with(driver: &str, config: SessionConfig) -> (TempDir, Session) {
    let (dir, client) = sqlite_client(driver.parse().unwrap()).await;
    let session = Session::new(driver, client, config);

    // Readers on other pooled connections must not block a commit.
    session
        .exec_query(None, "PRAGMA journal_mode = WAL", &[])
        .await
        .unwrap();
    session
        .exec_query(
            None,
            "CREATE TABLE t (id INTEGER PRIMARY KEY, x INTEGER NOT NULL, label TEXT)",
            &[],
        )
        .await
        .unwrap();
    session
        .exec_query(
            None,
            "INSERT INTO t (id, x, label) VALUES (?, ?, ?), (?, ?, ?)",
            &params![1, 0, "first", 2, 0, "second"],
        )
        .await
        .unwrap();

    (dir, session)
}

/// Read column `x` of row `id`, through `tx` when given.
pub(crate) async fn read_x(session: &Session, tx: Option<&ActiveTx>, id: i64) -> i64 {
    session
        .query_row(tx, "SELECT x FROM t WHERE id = ?", &params![id])
        .await
        .unwrap()
        .expect("row exists")
        .get("x")
        .unwrap()
}
