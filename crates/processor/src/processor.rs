//! The command processor: one atomic unit of work per command.

use std::sync::Arc;

use common::AccountId;
use domain::{AccountCommand, AccountError, AccountEvent};
use event_store::{EventEnvelope, EventStore, EventStoreError, Version};

use crate::error::ProcessorError;
use crate::idempotency::IdempotencyCache;
use crate::publisher::EventPublisher;
use crate::replay::ReplayService;

/// Default bound on reload-and-retry attempts after a concurrency conflict.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Orchestrates the write pipeline for a single command:
///
/// 1. idempotency check; a hit returns the recorded batch verbatim;
/// 2. observe the current version and replay state;
/// 3. validate + execute the command against that state (transfers also
///    check the target account);
/// 4. append the produced events with the observed version as
///    `expected_version`;
/// 5. on success, record the idempotency entry, hand the batch to the
///    publisher, and return it;
/// 6. on a concurrency conflict, restart from step 2 up to a bounded number
///    of attempts.
///
/// The store's version check, not this processor, is the arbiter of write
/// ordering per account; commands on different accounts proceed fully in
/// parallel.
pub struct CommandProcessor<S: EventStore> {
    store: Arc<S>,
    replay: ReplayService<S>,
    idempotency: IdempotencyCache,
    publisher: Arc<dyn EventPublisher>,
    max_retries: u32,
}

impl<S: EventStore> CommandProcessor<S> {
    /// Creates a processor with the default idempotency cache and retry
    /// bound.
    pub fn new(store: Arc<S>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_settings(store, publisher, IdempotencyCache::new(), DEFAULT_MAX_RETRIES)
    }

    /// Creates a processor with explicit cache and retry settings.
    pub fn with_settings(
        store: Arc<S>,
        publisher: Arc<dyn EventPublisher>,
        idempotency: IdempotencyCache,
        max_retries: u32,
    ) -> Self {
        let replay = ReplayService::new(store.clone());
        Self {
            store,
            replay,
            idempotency,
            publisher,
            max_retries,
        }
    }

    /// Returns the replay service backing this processor.
    pub fn replay_service(&self) -> &ReplayService<S> {
        &self.replay
    }

    /// Returns the underlying event store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Processes one command to completion.
    ///
    /// Either the full event batch is durably appended and returned, or a
    /// typed error is returned and nothing was written. Retried duplicates
    /// (same command id) are answered from the idempotency cache without
    /// reprocessing.
    #[tracing::instrument(
        skip(self, command),
        fields(command_type = command.command_type(), account_id = %command.account_id())
    )]
    pub async fn process(
        &self,
        command: &AccountCommand,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        if let Some(cached) = self.idempotency.check(command).await {
            metrics::counter!("ledger_idempotency_hits_total").increment(1);
            tracing::debug!(command_id = command.command_id(), "idempotency cache hit");
            return Ok(cached);
        }

        metrics::counter!("ledger_commands_total").increment(1);

        let mut attempt = 0u32;
        let envelopes = loop {
            attempt += 1;
            match self.attempt(command).await {
                Ok(envelopes) => break envelopes,
                Err(ProcessorError::Store(EventStoreError::ConcurrencyConflict {
                    ..
                })) if attempt < self.max_retries => {
                    metrics::counter!("ledger_concurrency_conflicts_total").increment(1);
                    tracing::debug!(attempt, "concurrency conflict, reloading and retrying");
                }
                Err(err @ ProcessorError::Store(EventStoreError::ConcurrencyConflict {
                    ..
                })) => {
                    metrics::counter!("ledger_concurrency_conflicts_total").increment(1);
                    tracing::warn!(error = %err, attempts = attempt, "conflict retry budget exhausted");
                    return Err(ProcessorError::ConflictRetriesExhausted {
                        account_id: command.account_id().clone(),
                        attempts: attempt,
                    });
                }
                Err(err) => return Err(err),
            }
        };

        self.idempotency.record(command, &envelopes).await;

        // Publication is informational fan-out; a failure is logged but the
        // command already succeeded and the events are durable in the store.
        if let Err(err) = self
            .publisher
            .publish(command.account_id(), &envelopes)
            .await
        {
            tracing::warn!(error = %err, "event publication failed");
        }

        Ok(envelopes)
    }

    /// One pipeline attempt: observe version, replay, validate, execute,
    /// append.
    async fn attempt(
        &self,
        command: &AccountCommand,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        let account_id = command.account_id();

        let observed = self.store.current_version(account_id).await?;
        let state = match observed {
            Some(_) => self.replay.try_replay(account_id).await?,
            None => None,
        };

        command.validate(state.as_ref())?;

        // Transfers also need the target side checked before any event is
        // appended; the two logs stay independent otherwise.
        if let Some(transfer) = command.transfer_target() {
            let source = state.as_ref().ok_or_else(|| AccountError::NotFound {
                account_id: account_id.clone(),
            })?;
            let target = self
                .replay
                .try_replay(&transfer.target_account_id)
                .await?
                .ok_or_else(|| AccountError::NotFound {
                    account_id: transfer.target_account_id.clone(),
                })?;
            source.can_transfer(&target, transfer.amount)?;
        }

        let events = command.execute(state.as_ref())?;
        let expected = observed.unwrap_or_else(Version::initial);
        let envelopes = build_envelopes(account_id, command.operator_id(), expected, &events)?;

        self.store
            .append(account_id, expected, envelopes.clone())
            .await?;

        Ok(envelopes)
    }
}

/// Wraps domain events into envelopes with sequential versions following
/// `current`.
fn build_envelopes(
    account_id: &AccountId,
    operator_id: &str,
    current: Version,
    events: &[AccountEvent],
) -> Result<Vec<EventEnvelope>, serde_json::Error> {
    let mut envelopes = Vec::with_capacity(events.len());
    let mut version = current;

    for event in events {
        version = version.next();
        let envelope = EventEnvelope::builder()
            .account_id(account_id.clone())
            .operator_id(operator_id)
            .event_type(event.event_type())
            .version(version)
            .payload(event)?
            .build();
        envelopes.push(envelope);
    }

    Ok(envelopes)
}
