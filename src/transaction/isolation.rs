//! Transaction isolation levels and options.
//!
//! Options are handed to the backend unmodified. How they are rendered
//! (a `BEGIN` clause, a `SET TRANSACTION` statement, or an ORM call) is
//! the backend's business.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Dirty reads allowed.
    ReadUncommitted,
    /// Each statement sees data committed before it began.
    ReadCommitted,
    /// All statements see the snapshot taken at the first read.
    RepeatableRead,
    /// Transactions behave as if run one after another.
    Serializable,
}

impl IsolationLevel {
    /// SQL spelling of this level, as used in `ISOLATION LEVEL <level>`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Parse isolation level from string (SQL syntax or snake_case).
impl std::str::FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "READ UNCOMMITTED" => Ok(IsolationLevel::ReadUncommitted),
            "READ COMMITTED" => Ok(IsolationLevel::ReadCommitted),
            "REPEATABLE READ" => Ok(IsolationLevel::RepeatableRead),
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            _ => Err(format!("unknown isolation level: {}", s)),
        }
    }
}

/// Options applied when a session begins a transaction.
///
/// The default (no isolation level, read-write) leaves the database's own
/// defaults in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionOptions {
    /// Isolation level, or `None` for the database default.
    pub isolation: Option<IsolationLevel>,
    /// Start the transaction in read-only access mode.
    pub read_only: bool,
}

impl TransactionOptions {
    /// Options that keep every database default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level.
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    /// Set the read-only flag.
    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// True when no option deviates from the database default.
    pub fn is_default(&self) -> bool {
        self.isolation.is_none() && !self.read_only
    }

    /// Transaction characteristics in standard SQL, e.g.
    /// `ISOLATION LEVEL SERIALIZABLE, READ ONLY`.
    ///
    /// Returns `None` for default options.
    pub fn characteristics(&self) -> Option<String> {
        let mut parts = Vec::with_capacity(2);
        if let Some(level) = self.isolation {
            parts.push(format!("ISOLATION LEVEL {}", level));
        }
        if self.read_only {
            parts.push("READ ONLY".to_string());
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TransactionOptions::default();
        assert!(options.is_default());
        assert_eq!(options.characteristics(), None);
    }

    #[test]
    fn test_characteristics() {
        let options = TransactionOptions::new()
            .isolation(IsolationLevel::Serializable)
            .read_only(true);
        assert!(!options.is_default());
        assert_eq!(
            options.characteristics().as_deref(),
            Some("ISOLATION LEVEL SERIALIZABLE, READ ONLY")
        );

        let read_only = TransactionOptions::new().read_only(true);
        assert_eq!(read_only.characteristics().as_deref(), Some("READ ONLY"));
    }

    #[test]
    fn test_parse_isolation() {
        assert_eq!(
            "READ COMMITTED".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::ReadCommitted
        );
        assert_eq!(
            "repeatable_read".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::RepeatableRead
        );
        assert_eq!(
            "serializable".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::Serializable
        );
        assert!("snapshot".parse::<IsolationLevel>().is_err());
    }

    #[test]
    fn test_options_deserialize() {
        let options: TransactionOptions =
            serde_json::from_str(r#"{"isolation": "read_committed"}"#).unwrap();
        assert_eq!(options.isolation, Some(IsolationLevel::ReadCommitted));
        assert!(!options.read_only);
    }
}
