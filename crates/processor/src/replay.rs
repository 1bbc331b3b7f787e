//! State reconstruction by replaying an account's event history.

use std::sync::Arc;

use common::AccountId;
use domain::account::replay::{apply_envelopes, fold_envelopes};
use domain::{AccountError, AccountState};
use event_store::EventStore;

use crate::error::ProcessorError;

/// Rebuilds account state by folding stored events through the aggregate's
/// transition function.
///
/// Replay is deterministic: the same event sequence always yields the same
/// state.
pub struct ReplayService<S: EventStore> {
    store: Arc<S>,
}

impl<S: EventStore> ReplayService<S> {
    /// Creates a replay service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Replays the full event history of an account.
    ///
    /// An account with zero events is reported as [`AccountError::NotFound`],
    /// so callers can distinguish "never created" from "created with zero
    /// balance".
    #[tracing::instrument(skip(self))]
    pub async fn replay(&self, account_id: &AccountId) -> Result<AccountState, ProcessorError> {
        self.try_replay(account_id)
            .await?
            .ok_or_else(|| {
                AccountError::NotFound {
                    account_id: account_id.clone(),
                }
                .into()
            })
    }

    /// Replays the full event history, returning `None` for an account that
    /// has never been created.
    pub async fn try_replay(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<AccountState>, ProcessorError> {
        let envelopes = self.store.read_all_events(account_id).await?;
        let event_count = envelopes.len();
        let state = fold_envelopes(account_id, &envelopes)?;

        metrics::counter!("ledger_event_replays_total").increment(1);
        tracing::debug!(%account_id, event_count, "replayed account history");

        Ok(state)
    }

    /// Replays from the latest snapshot checkpoint, folding only the event
    /// suffix past it. Falls back to a full replay when no snapshot exists.
    #[tracing::instrument(skip(self))]
    pub async fn replay_from_checkpoint(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountState, ProcessorError> {
        match self.store.get_snapshot(account_id).await? {
            Some(snapshot) => {
                let from = snapshot.version.next();
                let mut state: AccountState = snapshot.into_state()?;
                let suffix = self.store.read_events(account_id, from).await?;
                apply_envelopes(&mut state, &suffix)?;

                metrics::counter!("ledger_event_replays_total").increment(1);
                tracing::debug!(%account_id, suffix_len = suffix.len(), "replayed from checkpoint");

                Ok(state)
            }
            None => self.replay(account_id).await,
        }
    }
}
