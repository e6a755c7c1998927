//! Session configuration.
//!
//! Built in code with the builder methods or loaded from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{SessionError, SessionResult};
use crate::transaction::TransactionOptions;

/// Session configuration options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Options every transaction begins with.
    pub options: TransactionOptions,
    /// Upper bound on a single transaction, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transaction options.
    pub fn options(mut self, options: TransactionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the transaction timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn transaction_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> SessionResult<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.timeout_ms == Some(0) {
            return Err(SessionError::InvalidConfig(
                "timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl From<TransactionOptions> for SessionConfig {
    fn from(options: TransactionOptions) -> Self {
        Self::new().options(options)
    }
}
