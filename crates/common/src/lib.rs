//! Shared identifier types used across the ledger command core.

pub mod types;

pub use types::{AccountId, TransactionId};
