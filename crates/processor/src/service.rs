//! High-level account service: the typed inbound command boundary.

use std::sync::Arc;

use common::AccountId;
use domain::{
    AccountCommand, AccountState, ChangeBalance, CloseAccount, CreateAccount, FreezeAccount,
    Transfer, UnfreezeAccount,
};
use event_store::{EventEnvelope, EventStore};

use crate::config::ProcessorConfig;
use crate::consensus::{Coordination, LocalCoordinator};
use crate::error::ProcessorError;
use crate::idempotency::IdempotencyCache;
use crate::processor::CommandProcessor;
use crate::publisher::EventPublisher;
use crate::replay::ReplayService;

/// Service for submitting account commands.
///
/// This is the boundary a transport adapter (RPC/HTTP) maps wire messages
/// onto: typed commands in, generated events or a typed error out. All
/// submissions flow through the leader coordination contract.
pub struct AccountService<S: EventStore> {
    coordination: Arc<dyn Coordination>,
    replay: ReplayService<S>,
}

impl<S: EventStore + 'static> AccountService<S> {
    /// Creates a service over an existing coordinator.
    pub fn new(store: Arc<S>, coordination: Arc<dyn Coordination>) -> Self {
        Self {
            coordination,
            replay: ReplayService::new(store),
        }
    }

    /// Creates a single-node service: a local coordinator wrapping a fresh
    /// processor over the given store and publisher.
    pub fn single_node(store: Arc<S>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_config(store, publisher, ProcessorConfig::default())
    }

    /// Creates a single-node service with explicit configuration.
    pub fn with_config(
        store: Arc<S>,
        publisher: Arc<dyn EventPublisher>,
        config: ProcessorConfig,
    ) -> Self {
        let processor = CommandProcessor::with_settings(
            store.clone(),
            publisher,
            IdempotencyCache::with_retention(config.idempotency_retention),
            config.max_retries,
        );
        let coordinator = Arc::new(LocalCoordinator::new(config.node_id, processor));
        Self::new(store, coordinator)
    }

    /// Returns the coordinator this service submits through.
    pub fn coordination(&self) -> &Arc<dyn Coordination> {
        &self.coordination
    }

    /// Creates a new account.
    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id))]
    pub async fn create_account(
        &self,
        cmd: CreateAccount,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        self.submit(cmd.into()).await
    }

    /// Credits or debits an account.
    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id))]
    pub async fn change_balance(
        &self,
        cmd: ChangeBalance,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        self.submit(cmd.into()).await
    }

    /// Transfers funds out of an account.
    #[tracing::instrument(
        skip(self, cmd),
        fields(account_id = %cmd.account_id, target = %cmd.target_account_id)
    )]
    pub async fn transfer(&self, cmd: Transfer) -> Result<Vec<EventEnvelope>, ProcessorError> {
        self.submit(cmd.into()).await
    }

    /// Freezes an account.
    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id))]
    pub async fn freeze_account(
        &self,
        cmd: FreezeAccount,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        self.submit(cmd.into()).await
    }

    /// Unfreezes an account.
    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id))]
    pub async fn unfreeze_account(
        &self,
        cmd: UnfreezeAccount,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        self.submit(cmd.into()).await
    }

    /// Closes an account.
    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id))]
    pub async fn close_account(
        &self,
        cmd: CloseAccount,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        self.submit(cmd.into()).await
    }

    /// Loads an account's current state by replaying its history.
    ///
    /// Returns `None` if the account has never been created.
    #[tracing::instrument(skip(self))]
    pub async fn get_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<AccountState>, ProcessorError> {
        self.replay.try_replay(account_id).await
    }

    async fn submit(
        &self,
        command: AccountCommand,
    ) -> Result<Vec<EventEnvelope>, ProcessorError> {
        self.coordination.submit(&command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::InMemoryEventPublisher;
    use common::TransactionId;
    use domain::{AccountStatus, AssetType};
    use event_store::InMemoryEventStore;
    use rust_decimal::Decimal;

    fn service() -> AccountService<InMemoryEventStore> {
        AccountService::single_node(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryEventPublisher::new()),
        )
    }

    fn create_cmd(account: &str, initial: i64) -> CreateAccount {
        CreateAccount::new(
            AccountId::new(account),
            "op-1",
            "alice",
            "USD",
            AssetType::Fiat,
            Decimal::from(initial),
            Decimal::ZERO,
            Decimal::from(1000),
        )
    }

    #[tokio::test]
    async fn create_and_get_account() {
        let service = service();
        service.create_account(create_cmd("ACC-001", 100)).await.unwrap();

        let state = service
            .get_account(&AccountId::new("ACC-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.balance, Decimal::from(100));
        assert_eq!(state.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn get_unknown_account_is_none() {
        let service = service();
        let state = service.get_account(&AccountId::new("ACC-404")).await.unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let service = service();
        let account_id = AccountId::new("ACC-001");

        service.create_account(create_cmd("ACC-001", 100)).await.unwrap();
        service
            .change_balance(ChangeBalance::new(
                account_id.clone(),
                "op-1",
                Decimal::from(-100),
                TransactionId::new("TX-1"),
            ))
            .await
            .unwrap();
        service
            .close_account(CloseAccount::new(account_id.clone(), "op-1", "done"))
            .await
            .unwrap();

        let state = service.get_account(&account_id).await.unwrap().unwrap();
        assert_eq!(state.status, AccountStatus::Closed);
        assert_eq!(state.balance, Decimal::ZERO);
    }
}
