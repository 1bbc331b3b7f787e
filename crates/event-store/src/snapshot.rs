use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Version};

/// A replay checkpoint: an account's state serialized at a specific version.
///
/// Snapshots let replay start from a checkpoint and fold only the event
/// suffix, instead of the full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The account this snapshot belongs to.
    pub account_id: AccountId,

    /// The version of the account at the time of the snapshot.
    pub version: Version,

    /// When the snapshot was created.
    pub timestamp: DateTime<Utc>,

    /// The serialized account state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a new snapshot.
    pub fn new(account_id: AccountId, version: Version, state: serde_json::Value) -> Self {
        Self {
            account_id,
            version,
            timestamp: Utc::now(),
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(
        account_id: AccountId,
        version: Version,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            account_id,
            version,
            timestamp: Utc::now(),
            state: serde_json::to_value(state)?,
        })
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }
}
