//! Leader coordination contract.
//!
//! At most one node may append to a given account's log at a given version
//! at a time. A non-leader must reject commands with a "not leader" signal
//! rather than process them, and a leader must not acknowledge a command
//! until the appended batch is durable on a quorum. This module specifies
//! that contract and provides the single-node implementation; a real
//! consensus/replication layer plugs in behind [`Coordination`] without
//! changing the processor.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::AccountId;
use domain::AccountCommand;
use event_store::{EventEnvelope, EventStore};
use tokio::sync::Mutex;

use crate::error::ProcessorError;
use crate::processor::CommandProcessor;

/// Identifier of a node in the cluster.
pub type NodeId = String;

/// Entry point for command submission under leader coordination.
#[async_trait]
pub trait Coordination: Send + Sync {
    /// Submits a command for processing.
    ///
    /// On a non-leader this fails with [`ProcessorError::NotLeader`] carrying
    /// the current leader's id; on the leader it returns only after the
    /// appended batch is durable per the implementation's guarantee.
    async fn submit(
        &self,
        command: &AccountCommand,
    ) -> Result<Vec<EventEnvelope>, ProcessorError>;

    /// Returns true if this node currently holds leadership.
    fn is_leader(&self) -> bool;

    /// Records the current leader.
    fn set_leader(&self, leader_id: NodeId);

    /// Returns the current leader, if known.
    fn leader_id(&self) -> Option<NodeId>;
}

/// Single-node coordinator.
///
/// Leadership is trivially held by this node until `set_leader` hands it
/// elsewhere. Local mutual exclusion per account id serializes submitters so
/// concurrent commands on one account do not burn conflict retries against
/// each other; the store's version check remains the actual ordering
/// guarantee. The quorum for durability is the local store itself.
pub struct LocalCoordinator<S: EventStore> {
    node_id: NodeId,
    leader: RwLock<Option<NodeId>>,
    processor: CommandProcessor<S>,
    account_locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl<S: EventStore> LocalCoordinator<S> {
    /// Creates a coordinator that starts as its own leader.
    pub fn new(node_id: impl Into<NodeId>, processor: CommandProcessor<S>) -> Self {
        let node_id = node_id.into();
        Self {
            leader: RwLock::new(Some(node_id.clone())),
            node_id,
            processor,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns this node's id.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Returns the wrapped processor.
    pub fn processor(&self) -> &CommandProcessor<S> {
        &self.processor
    }

    async fn account_lock(&self, account_id: &AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.account_locks.lock().await;
        locks
            .entry(account_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Replication hook.
    ///
    /// Extension point for a replication layer: an implementation backed by
    /// a cluster must not return until the batch is durable on a quorum of
    /// nodes. Locally the store's own durability is the quorum, so this
    /// completes immediately.
    async fn replicate(
        &self,
        _account_id: &AccountId,
        _events: &[EventEnvelope],
    ) -> Result<(), ProcessorError> {
        Ok(())
    }
}

#[async_trait]
impl<S: EventStore> Coordination for LocalCoordinator<S> {
    #[tracing::instrument(skip(self, command), fields(account_id = %command.account_id()))]
    async fn submit(
        &self,
        command: &AccountCommand,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        if !self.is_leader() {
            let leader_id = self.leader_id();
            tracing::debug!(?leader_id, "rejecting command on non-leader");
            return Err(ProcessorError::NotLeader { leader_id });
        }

        let lock = self.account_lock(command.account_id()).await;
        let _guard = lock.lock().await;

        let events = self.processor.process(command).await?;
        self.replicate(command.account_id(), &events).await?;
        Ok(events)
    }

    fn is_leader(&self) -> bool {
        self.leader
            .read()
            .expect("leader lock poisoned")
            .as_deref()
            == Some(self.node_id.as_str())
    }

    fn set_leader(&self, leader_id: NodeId) {
        *self.leader.write().expect("leader lock poisoned") = Some(leader_id);
    }

    fn leader_id(&self) -> Option<NodeId> {
        self.leader.read().expect("leader lock poisoned").clone()
    }
}
