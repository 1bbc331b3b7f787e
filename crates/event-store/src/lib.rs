//! Append-only event store for the ledger command core.
//!
//! Each account owns a strictly-ordered event sequence keyed
//! `(account_id, version)`. Appends are atomic batches guarded by an
//! optimistic version check; a parallel current-version index supports
//! conflict detection without scanning the log.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod snapshot;
pub mod store;

pub use common::AccountId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use snapshot::Snapshot;
pub use store::{EventStore, validate_events_for_append};
