//! Pipeline error types.

use common::AccountId;
use domain::AccountError;
use event_store::EventStoreError;
use thiserror::Error;

/// Errors surfaced by the command processing pipeline.
///
/// Business-rule rejections ([`AccountError`]) pass through unchanged.
/// Concurrency conflicts are retried internally and only surface as
/// [`ProcessorError::ConflictRetriesExhausted`] once the retry budget is
/// spent. Storage failures are never swallowed.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// A business-rule validation failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// The event store failed.
    #[error("Event store error: {0}")]
    Store(#[from] EventStoreError),

    /// The append kept conflicting after the bounded retry budget.
    #[error("Concurrency conflict persisted after {attempts} attempts for account {account_id}")]
    ConflictRetriesExhausted {
        account_id: AccountId,
        attempts: u32,
    },

    /// This node is not the leader; the command must be retried against the
    /// current leader.
    #[error("Not the current leader, retry against {}", .leader_id.as_deref().unwrap_or("unknown"))]
    NotLeader { leader_id: Option<String> },

    /// Event payload serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
