//! Idempotency cache for command deduplication.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::AccountCommand;
use event_store::EventEnvelope;
use tokio::sync::RwLock;

/// Default retention window for idempotency records.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    events: Vec<EventEnvelope>,
    recorded_at: Instant,
}

/// Deduplicates commands by `(command_type, command_id)` within a bounded
/// retention window.
///
/// A hit short-circuits reprocessing and returns the recorded event batch
/// verbatim. The cache is best-effort: eviction or expiry only costs retry
/// latency, because a replayed command past the window fails the store's
/// `expected_version` check instead of double-applying.
#[derive(Clone)]
pub struct IdempotencyCache {
    entries: Arc<RwLock<HashMap<(String, String), Entry>>>,
    retention: Duration,
}

impl IdempotencyCache {
    /// Creates a cache with the default 24h retention window.
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Creates a cache with a custom retention window.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    fn key(command: &AccountCommand) -> (String, String) {
        (
            command.command_type().to_string(),
            command.command_id().to_string(),
        )
    }

    /// Returns the recorded result for a previously processed command, if it
    /// is still within the retention window.
    pub async fn check(&self, command: &AccountCommand) -> Option<Vec<EventEnvelope>> {
        let entries = self.entries.read().await;
        entries
            .get(&Self::key(command))
            .filter(|entry| entry.recorded_at.elapsed() < self.retention)
            .map(|entry| entry.events.clone())
    }

    /// Records the result of a processed command and prunes expired entries.
    pub async fn record(&self, command: &AccountCommand, events: &[EventEnvelope]) {
        let mut entries = self.entries.write().await;
        let retention = self.retention;
        entries.retain(|_, entry| entry.recorded_at.elapsed() < retention);
        entries.insert(
            Self::key(command),
            Entry {
                events: events.to_vec(),
                recorded_at: Instant::now(),
            },
        );
    }

    /// Returns the number of live entries (expired entries included until
    /// the next `record` prunes them).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for IdempotencyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AccountId;
    use domain::FreezeAccount;
    use event_store::Version;

    fn command() -> AccountCommand {
        FreezeAccount::new(AccountId::new("ACC-001"), "op-1", "fraud").into()
    }

    fn envelope(account_id: &AccountId) -> EventEnvelope {
        EventEnvelope::builder()
            .account_id(account_id.clone())
            .operator_id("op-1")
            .event_type("AccountFrozen")
            .version(Version::new(2))
            .payload_raw(serde_json::json!({"reason": "fraud"}))
            .build()
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = IdempotencyCache::new();
        let cmd = command();

        assert!(cache.check(&cmd).await.is_none());

        let events = vec![envelope(&AccountId::new("ACC-001"))];
        cache.record(&cmd, &events).await;

        let cached = cache.check(&cmd).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].event_id, events[0].event_id);
    }

    #[tokio::test]
    async fn different_command_ids_do_not_collide() {
        let cache = IdempotencyCache::new();
        let first = command();
        let second = command(); // fresh command id

        cache
            .record(&first, &[envelope(&AccountId::new("ACC-001"))])
            .await;
        assert!(cache.check(&second).await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let cache = IdempotencyCache::with_retention(Duration::from_millis(20));
        let cmd = command();

        cache
            .record(&cmd, &[envelope(&AccountId::new("ACC-001"))])
            .await;
        assert!(cache.check(&cmd).await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.check(&cmd).await.is_none());
    }

    #[tokio::test]
    async fn record_prunes_expired_entries() {
        let cache = IdempotencyCache::with_retention(Duration::from_millis(20));
        let old = command();
        cache
            .record(&old, &[envelope(&AccountId::new("ACC-001"))])
            .await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        let fresh = command();
        cache
            .record(&fresh, &[envelope(&AccountId::new("ACC-001"))])
            .await;

        assert_eq!(cache.len().await, 1);
    }
}
