//! Transactional sessions.
//!
//! A session runs caller-supplied work inside a transaction and commits or
//! rolls back based on the work's result. The algorithm is written once in
//! [`BackendSession`] and is the same for every backend; [`Session`] picks
//! the backend at runtime from a driver identifier.
//!
//! ```text
//!   Session::new("postgres", Client::Sql(pool), config)
//!        │
//!        ▼
//!   transaction(work) ──► begin ──► work(tx) ──┬─ Ok  ──► commit
//!                            │                 └─ Err ──► rollback
//!                            └─ Err ──► returned, work never runs
//! ```
//!
//! Query operations take the transaction handle explicitly. Passing
//! `None` runs the statement on the client outside any transaction.

mod config;
mod driver;
mod error;
mod factory;
#[allow(clippy::module_inception)]
mod session;

pub use config::SessionConfig;
pub use driver::{Client, Driver, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
pub use error::{SessionError, SessionResult};
pub use factory::{ActiveTx, OrmSession, OrmTx, Session, SqlSession, SqlTx};
pub use session::{BackendSession, Transactional};
