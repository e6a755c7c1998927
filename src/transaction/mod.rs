//! Transaction primitives shared by every backend.
//!
//! A session begins a transaction on its backend, wraps the live
//! transaction in a [`TxHandle`] and registers it in a
//! [`TransactionRegistry`] until the transaction finishes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Session                              │
//! │  (begin → work(handle) → commit | rollback, per call)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │  TxHandle   │       │ Transaction │       │ Transaction │
//!  │ (live conn) │       │   Options   │       │  Registry   │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```

mod handle;
mod isolation;
mod registry;

pub use handle::{TransactionMetadata, TxHandle};
pub use isolation::{IsolationLevel, TransactionOptions};
pub use registry::TransactionRegistry;
