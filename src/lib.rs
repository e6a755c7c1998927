//! txsession - transactional sessions over sqlx and SeaORM
//!
//! This crate lets callers run a unit of work inside a database
//! transaction without knowing whether a raw SQL pool or an ORM
//! connection sits underneath. The session begins the transaction, hands
//! the live handle to the work, and commits or rolls back on the result.
//!
//! # Example
//!
//! ```no_run
//! use txsession::params;
//! use txsession::session::{Client, Driver, Session, SessionConfig, SessionError, Transactional};
//!
//! # async fn example() -> Result<(), SessionError> {
//! let client = Client::connect(Driver::Postgres, "postgres://localhost/app").await?;
//! let session = Session::new("postgres", client, SessionConfig::default());
//!
//! let s = session.clone();
//! session
//!     .transaction(move |tx| async move {
//!         s.exec_query(Some(&tx), "UPDATE accounts SET balance = balance - $1 WHERE id = $2", &params![10, 1])
//!             .await?;
//!         s.exec_query(Some(&tx), "UPDATE accounts SET balance = balance + $1 WHERE id = $2", &params![10, 2])
//!             .await?;
//!         Ok::<_, SessionError>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod query;
pub mod session;
pub mod transaction;

#[cfg(test)]
mod test_support;

pub use query::Param;
pub use session::{
    ActiveTx, Client, Driver, Session, SessionConfig, SessionError, SessionResult, Transactional,
};
