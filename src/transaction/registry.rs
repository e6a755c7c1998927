//! Registry of open transactions.
//!
//! Each session keeps one registry. A transaction is registered when it
//! begins and removed when its [`Registration`] guard drops, which covers
//! commit, rollback, timeouts, panics and cancelled futures alike.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::transaction::handle::TransactionMetadata;

/// Open transactions tracked by ID.
#[derive(Debug, Default)]
pub struct TransactionRegistry {
    active: RwLock<HashMap<String, TransactionMetadata>>,
}

impl TransactionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a transaction until the returned guard is dropped.
    pub(crate) fn register(&self, metadata: &TransactionMetadata) -> Registration<'_> {
        self.active
            .write()
            .insert(metadata.tx_id.clone(), metadata.clone());
        Registration {
            registry: self,
            tx_id: metadata.tx_id.clone(),
        }
    }

    /// Get the number of open transactions.
    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }

    /// List all open transaction IDs.
    pub fn active_transactions(&self) -> Vec<String> {
        self.active.read().keys().cloned().collect()
    }

    /// Check if a transaction is open.
    pub fn is_active(&self, tx_id: &str) -> bool {
        self.active.read().contains_key(tx_id)
    }

    /// Get metadata for an open transaction.
    pub fn get(&self, tx_id: &str) -> Option<TransactionMetadata> {
        self.active.read().get(tx_id).cloned()
    }
}

/// Keeps a transaction registered for as long as it lives.
pub(crate) struct Registration<'a> {
    registry: &'a TransactionRegistry,
    tx_id: String,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.active.write().remove(&self.tx_id);
    }
}
