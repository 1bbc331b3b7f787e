//! Outbound event publication port.
//!
//! After a successful append, the resulting batch is handed, in order, to a
//! publisher keyed by account id so a downstream consumer preserves
//! per-account order. Published events are informational fan-out, not the
//! system of record; this core does not retry publication failures.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::AccountId;
use event_store::EventEnvelope;
use thiserror::Error;

/// Error returned by a publisher.
#[derive(Debug, Error)]
#[error("Failed to publish events: {0}")]
pub struct PublishError(pub String);

/// Trait for outbound event publication (e.g. a message bus).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an appended event batch, in order, keyed by account id.
    async fn publish(
        &self,
        account_id: &AccountId,
        events: &[EventEnvelope],
    ) -> Result<(), PublishError>;
}

/// Publisher that only logs batches. Useful when no bus is wired up.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(
        &self,
        account_id: &AccountId,
        events: &[EventEnvelope],
    ) -> Result<(), PublishError> {
        for event in events {
            tracing::info!(
                %account_id,
                event_type = %event.event_type,
                version = %event.version,
                "published event"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    batches: Vec<(AccountId, Vec<EventEnvelope>)>,
    fail_on_publish: bool,
}

/// In-memory publisher for testing.
///
/// Records every batch in arrival order and can be configured to fail, to
/// exercise the "publication failure does not fail the command" path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to fail on subsequent publish calls.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns the number of recorded batches.
    pub fn batch_count(&self) -> usize {
        self.state.read().unwrap().batches.len()
    }

    /// Returns all recorded batches in arrival order.
    pub fn batches(&self) -> Vec<(AccountId, Vec<EventEnvelope>)> {
        self.state.read().unwrap().batches.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(
        &self,
        account_id: &AccountId,
        events: &[EventEnvelope],
    ) -> Result<(), PublishError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_publish {
            return Err(PublishError("publisher configured to fail".to_string()));
        }
        state
            .batches
            .push((account_id.clone(), events.to_vec()));
        Ok(())
    }
}
