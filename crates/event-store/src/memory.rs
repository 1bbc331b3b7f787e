use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AccountId, EventEnvelope, EventStoreError, Result, Snapshot, Version,
    store::{EventStore, validate_events_for_append},
};

#[derive(Default)]
struct Inner {
    /// Per-account event sequences, stored in version order.
    events: HashMap<AccountId, Vec<EventEnvelope>>,
    /// Current-version index, maintained alongside the log.
    versions: HashMap<AccountId, Version>,
    snapshots: HashMap<AccountId, Snapshot>,
}

/// In-memory event store for testing and single-process deployments.
///
/// Provides the same contract as the PostgreSQL implementation: appends are
/// atomic per batch and serialized through the version check under a single
/// write lock.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored across all accounts.
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.events.values().map(Vec::len).sum()
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.events.clear();
        inner.versions.clear();
        inner.snapshots.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        account_id: &AccountId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version> {
        validate_events_for_append(&events)?;

        if events[0].account_id != *account_id {
            return Err(EventStoreError::InvalidBatch(format!(
                "batch is for account {}, append targets {}",
                events[0].account_id, account_id
            )));
        }

        let mut inner = self.inner.write().await;

        let current = inner
            .versions
            .get(account_id)
            .copied()
            .unwrap_or_else(Version::initial);

        if current != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                account_id: account_id.clone(),
                expected: expected_version,
                actual: current,
            });
        }

        if events[0].version != current.next() {
            return Err(EventStoreError::InvalidBatch(format!(
                "batch starts at version {}, log is at {}",
                events[0].version, current
            )));
        }

        let new_version = events.last().map(|e| e.version).unwrap_or(current);
        inner
            .events
            .entry(account_id.clone())
            .or_default()
            .extend(events);
        inner.versions.insert(account_id.clone(), new_version);

        Ok(new_version)
    }

    async fn read_events(
        &self,
        account_id: &AccountId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let inner = self.inner.read().await;
        let events = inner
            .events
            .get(account_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.version >= from_version)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(events)
    }

    async fn current_version(&self, account_id: &AccountId) -> Result<Option<Version>> {
        let inner = self.inner.read().await;
        Ok(inner.versions.get(account_id).copied())
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.snapshots.insert(snapshot.account_id.clone(), snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, account_id: &AccountId) -> Result<Option<Snapshot>> {
        let inner = self.inner.read().await;
        Ok(inner.snapshots.get(account_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(account_id: &AccountId, version: Version, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .account_id(account_id.clone())
            .operator_id("op-test")
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");
        let event = create_test_event(&account_id, Version::first(), "AccountCreated");

        let result = store
            .append(&account_id, Version::initial(), vec![event])
            .await;
        assert_eq!(result.unwrap(), Version::first());

        let events = store.read_all_events(&account_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_batch_assigns_sequential_versions() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");

        let events = vec![
            create_test_event(&account_id, Version::new(1), "AccountCreated"),
            create_test_event(&account_id, Version::new(2), "BalanceChanged"),
            create_test_event(&account_id, Version::new(3), "BalanceChanged"),
        ];

        let result = store.append(&account_id, Version::initial(), events).await;
        assert_eq!(result.unwrap(), Version::new(3));

        let stored = store.read_all_events(&account_id).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].version, Version::new(3));
    }

    #[tokio::test]
    async fn concurrency_conflict_on_stale_version() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");

        let event1 = create_test_event(&account_id, Version::first(), "AccountCreated");
        store
            .append(&account_id, Version::initial(), vec![event1])
            .await
            .unwrap();

        // Stale writer still believes the account has no history.
        let event2 = create_test_event(&account_id, Version::first(), "BalanceChanged");
        let result = store
            .append(&account_id, Version::initial(), vec![event2])
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn append_succeeds_with_matching_version() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");

        let event1 = create_test_event(&account_id, Version::first(), "AccountCreated");
        store
            .append(&account_id, Version::initial(), vec![event1])
            .await
            .unwrap();

        let event2 = create_test_event(&account_id, Version::new(2), "BalanceChanged");
        let result = store
            .append(&account_id, Version::first(), vec![event2])
            .await;

        assert_eq!(result.unwrap(), Version::new(2));
    }

    #[tokio::test]
    async fn no_partial_batch_on_conflict() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");

        let event1 = create_test_event(&account_id, Version::first(), "AccountCreated");
        store
            .append(&account_id, Version::initial(), vec![event1])
            .await
            .unwrap();

        let batch = vec![
            create_test_event(&account_id, Version::first(), "TransferInitiated"),
            create_test_event(&account_id, Version::new(2), "TransferCompleted"),
        ];
        let result = store.append(&account_id, Version::initial(), batch).await;
        assert!(result.is_err());

        // The failed batch left no trace.
        let events = store.read_all_events(&account_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            store.current_version(&account_id).await.unwrap(),
            Some(Version::first())
        );
    }

    #[tokio::test]
    async fn read_events_from_version() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");

        let events = vec![
            create_test_event(&account_id, Version::new(1), "AccountCreated"),
            create_test_event(&account_id, Version::new(2), "BalanceChanged"),
            create_test_event(&account_id, Version::new(3), "BalanceChanged"),
        ];
        store
            .append(&account_id, Version::initial(), events)
            .await
            .unwrap();

        let from_v2 = store
            .read_events(&account_id, Version::new(2))
            .await
            .unwrap();
        assert_eq!(from_v2.len(), 2);
        assert_eq!(from_v2[0].version, Version::new(2));
        assert_eq!(from_v2[1].version, Version::new(3));
    }

    #[tokio::test]
    async fn read_events_for_unknown_account_is_empty() {
        let store = InMemoryEventStore::new();
        let events = store
            .read_all_events(&AccountId::new("ACC-404"))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn current_version_none_without_history() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");

        let version = store.current_version(&account_id).await.unwrap();
        assert!(version.is_none());

        let events = vec![
            create_test_event(&account_id, Version::new(1), "AccountCreated"),
            create_test_event(&account_id, Version::new(2), "BalanceChanged"),
        ];
        store
            .append(&account_id, Version::initial(), events)
            .await
            .unwrap();

        let version = store.current_version(&account_id).await.unwrap();
        assert_eq!(version, Some(Version::new(2)));
    }

    #[tokio::test]
    async fn snapshot_save_and_retrieve() {
        let store = InMemoryEventStore::new();
        let account_id = AccountId::new("ACC-001");

        let snapshot = Snapshot::new(
            account_id.clone(),
            Version::new(5),
            serde_json::json!({"balance": "42.00"}),
        );

        store.save_snapshot(snapshot).await.unwrap();

        let retrieved = store.get_snapshot(&account_id).await.unwrap().unwrap();
        assert_eq!(retrieved.account_id, account_id);
        assert_eq!(retrieved.version, Version::new(5));
    }

    #[tokio::test]
    async fn snapshot_not_found() {
        let store = InMemoryEventStore::new();
        let result = store.get_snapshot(&AccountId::new("ACC-404")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn accounts_are_independent() {
        let store = InMemoryEventStore::new();
        let a1 = AccountId::new("ACC-001");
        let a2 = AccountId::new("ACC-002");

        store
            .append(
                &a1,
                Version::initial(),
                vec![create_test_event(&a1, Version::first(), "AccountCreated")],
            )
            .await
            .unwrap();
        store
            .append(
                &a2,
                Version::initial(),
                vec![create_test_event(&a2, Version::first(), "AccountCreated")],
            )
            .await
            .unwrap();

        assert_eq!(store.read_all_events(&a1).await.unwrap().len(), 1);
        assert_eq!(store.read_all_events(&a2).await.unwrap().len(), 1);
        assert_eq!(
            store.current_version(&a2).await.unwrap(),
            Some(Version::first())
        );
    }
}
