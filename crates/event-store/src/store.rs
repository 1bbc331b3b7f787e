use async_trait::async_trait;

use crate::{AccountId, EventEnvelope, EventStoreError, Result, Snapshot, Version};

/// Core trait for event store implementations.
///
/// The store is the sole arbiter of write ordering for a given account:
/// concurrent writers are serialized by the version check inside `append`,
/// not by any external lock. All implementations must be thread-safe.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events to an account's log.
    ///
    /// The append is atomic: the current version is re-read under the
    /// store's own transaction boundary, compared against
    /// `expected_version`, and the whole batch is written (with the
    /// current-version index updated) or nothing is. A reader can never
    /// observe a partial batch.
    ///
    /// `expected_version` is `Version::initial()` for an account with no
    /// history. Fails with [`EventStoreError::ConcurrencyConflict`] when the
    /// stored version has moved past it.
    ///
    /// Returns the new current version of the account.
    async fn append(
        &self,
        account_id: &AccountId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version>;

    /// Retrieves events for an account with `version >= from_version`,
    /// in ascending version order.
    ///
    /// Returns an empty vec for an account with no events; existence is not
    /// inferred here.
    async fn read_events(
        &self,
        account_id: &AccountId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves the full event history for an account.
    async fn read_all_events(&self, account_id: &AccountId) -> Result<Vec<EventEnvelope>> {
        self.read_events(account_id, Version::initial()).await
    }

    /// Gets the current version of an account's log.
    ///
    /// Returns `None` if the account has no history.
    async fn current_version(&self, account_id: &AccountId) -> Result<Option<Version>>;

    /// Saves a replay checkpoint for an account.
    ///
    /// If a snapshot already exists for this account, it is replaced.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest replay checkpoint for an account.
    ///
    /// Returns `None` if no snapshot exists.
    async fn get_snapshot(&self, account_id: &AccountId) -> Result<Option<Snapshot>>;
}

/// Validates a batch before appending.
///
/// The batch must be non-empty, scoped to a single account, and carry
/// strictly sequential versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let first = events
        .first()
        .ok_or_else(|| EventStoreError::InvalidBatch("empty event batch".to_string()))?;

    for event in events.iter().skip(1) {
        if event.account_id != first.account_id {
            return Err(EventStoreError::InvalidBatch(
                "all events in a batch must belong to the same account".to_string(),
            ));
        }
    }

    let mut expected = first.version;
    for event in events.iter().skip(1) {
        expected = expected.next();
        if event.version != expected {
            return Err(EventStoreError::InvalidBatch(format!(
                "event versions must be sequential: expected {}, got {}",
                expected, event.version
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;

    fn envelope(account: &str, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .account_id(AccountId::new(account))
            .event_type("AccountFrozen")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"reason": "test"}))
            .build()
    }

    #[test]
    fn empty_batch_is_invalid() {
        let result = validate_events_for_append(&[]);
        assert!(matches!(result, Err(EventStoreError::InvalidBatch(_))));
    }

    #[test]
    fn mixed_accounts_are_invalid() {
        let events = vec![envelope("A1", 1), envelope("A2", 2)];
        let result = validate_events_for_append(&events);
        assert!(matches!(result, Err(EventStoreError::InvalidBatch(_))));
    }

    #[test]
    fn non_sequential_versions_are_invalid() {
        let events = vec![envelope("A1", 1), envelope("A1", 3)];
        let result = validate_events_for_append(&events);
        assert!(matches!(result, Err(EventStoreError::InvalidBatch(_))));
    }

    #[test]
    fn sequential_batch_is_valid() {
        let events = vec![envelope("A1", 1), envelope("A1", 2), envelope("A1", 3)];
        assert!(validate_events_for_append(&events).is_ok());
    }
}
