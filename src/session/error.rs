//! Session error types.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while constructing or using a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Error from the raw SQL driver.
    #[error("sql driver error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Error from the ORM layer.
    #[error("orm error: {0}")]
    Orm(#[from] sea_orm::DbErr),

    /// Driver identifier not recognized.
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// Client handle does not match what the driver identifier implies,
    /// either its kind (`sql` / `orm`) or the database behind a SQL pool.
    #[error("driver {driver} expects a client of kind {expected}, found {found}")]
    ClientMismatch {
        driver: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Transaction handle from another backend.
    #[error("transaction handle from the {found} backend passed to a {expected} session")]
    BackendMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Transaction was already committed or rolled back.
    #[error("transaction {tx_id} is no longer active")]
    NotActive { tx_id: String },

    /// Transaction timeout.
    #[error("transaction {tx_id} timed out after {elapsed_ms}ms")]
    Timeout { tx_id: String, elapsed_ms: u64 },

    /// Work asked for its transaction to be rolled back.
    #[error("transaction aborted: {0}")]
    Aborted(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("internal session error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Create an abort error, for work that wants its transaction rolled back.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted(reason.into())
    }

    /// Check if this error came from one of the underlying clients.
    pub fn is_driver_error(&self) -> bool {
        matches!(self, SessionError::Sql(_) | SessionError::Orm(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let driver = SessionError::Sql(sqlx::Error::RowNotFound);
        assert!(driver.is_driver_error());

        let aborted = SessionError::aborted("dry run");
        assert!(!aborted.is_driver_error());
        assert_eq!(aborted.to_string(), "transaction aborted: dry run");
    }

    #[test]
    fn test_mismatch_message() {
        let err = SessionError::ClientMismatch {
            driver: "postgres".into(),
            expected: "sql",
            found: "orm",
        };
        assert_eq!(
            err.to_string(),
            "driver postgres expects a client of kind sql, found orm"
        );
    }
}
