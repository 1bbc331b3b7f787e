//! Folding stored event envelopes back into account state.

use common::AccountId;
use event_store::EventEnvelope;

use super::{AccountEvent, AccountState};

/// Folds a full envelope history into account state.
///
/// Returns `Ok(None)` when the history contains no creation event: the
/// account has never been created, which callers must distinguish from
/// "created with zero balance".
///
/// Envelopes with unrecognized `event_type` tags are skipped (forward
/// compatibility) but still advance the version and operator bookkeeping so
/// the reconstructed state matches the log's current version.
pub fn fold_envelopes(
    account_id: &AccountId,
    envelopes: &[EventEnvelope],
) -> Result<Option<AccountState>, serde_json::Error> {
    let mut state: Option<AccountState> = None;

    for envelope in envelopes {
        if !AccountEvent::is_known_type(&envelope.event_type) {
            tracing::warn!(
                account_id = %envelope.account_id,
                event_type = %envelope.event_type,
                version = %envelope.version,
                "skipping unknown event type during replay"
            );
            record_envelope(&mut state, envelope);
            continue;
        }

        let event: AccountEvent = serde_json::from_value(envelope.payload.clone())?;
        match (&mut state, &event) {
            (None, AccountEvent::AccountCreated(data)) => {
                state = Some(AccountState::from_created(account_id.clone(), data));
            }
            (None, _) => {
                // Cannot fold a movement without a creation fact; the store
                // never produces this ordering for its own appends.
                tracing::warn!(
                    account_id = %envelope.account_id,
                    event_type = %envelope.event_type,
                    "event precedes account creation, skipping"
                );
                continue;
            }
            (Some(current), event) => current.apply(event),
        }
        record_envelope(&mut state, envelope);
    }

    Ok(state)
}

/// Applies an envelope suffix onto an existing state (checkpoint replay).
pub fn apply_envelopes(
    state: &mut AccountState,
    envelopes: &[EventEnvelope],
) -> Result<(), serde_json::Error> {
    for envelope in envelopes {
        if AccountEvent::is_known_type(&envelope.event_type) {
            let event: AccountEvent = serde_json::from_value(envelope.payload.clone())?;
            state.apply(&event);
        } else {
            tracing::warn!(
                account_id = %envelope.account_id,
                event_type = %envelope.event_type,
                version = %envelope.version,
                "skipping unknown event type during replay"
            );
        }
        state.version = envelope.version;
        state.last_operator_id = Some(envelope.operator_id.clone());
    }
    Ok(())
}

fn record_envelope(state: &mut Option<AccountState>, envelope: &EventEnvelope) {
    if let Some(current) = state {
        current.version = envelope.version;
        current.last_operator_id = Some(envelope.operator_id.clone());
    }
}
