use thiserror::Error;

use crate::{AccountId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected version did not match the actual version.
    ///
    /// Recoverable: the caller reloads state at the new version and retries.
    #[error(
        "Concurrency conflict for account {account_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        account_id: AccountId,
        expected: Version,
        actual: Version,
    },

    /// The event batch handed to `append` is malformed (empty, mixed
    /// accounts, or non-sequential versions).
    #[error("Invalid event batch: {0}")]
    InvalidBatch(String),

    /// A database error occurred. Not retried at this layer.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Returns true if this error is a recoverable concurrency conflict.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
