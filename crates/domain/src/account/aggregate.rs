//! Account state and the pure event fold.

use common::{AccountId, TransactionId};
use event_store::Version;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AccountError;

use super::{
    AccountEvent, AccountStatus, AssetType,
    events::{AccountCreatedData, BalanceChangedData, TransferInitiatedData},
};

/// The derived, rebuildable state of one account.
///
/// State is never the primary store: it exists only as the left-fold of the
/// account's event history. `apply` is total, deterministic, and
/// side-effect-free, so replaying the same events always yields the same
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    /// The account this state belongs to.
    pub account_id: AccountId,

    /// Asset class held by the account.
    pub asset_type: AssetType,

    /// Current lifecycle status.
    pub status: AccountStatus,

    /// Current balance.
    pub balance: Decimal,

    /// Lower balance bound (inclusive).
    pub min_balance: Decimal,

    /// Upper balance bound (inclusive).
    pub max_balance: Decimal,

    /// Currency the account is denominated in.
    pub currency: String,

    /// Owner of the account.
    pub owner_id: String,

    /// Number of events applied; equals the log's current version.
    #[serde(default)]
    pub version: Version,

    /// Operator of the most recently applied event.
    pub last_operator_id: Option<String>,

    /// Transaction id of the most recent balance movement.
    pub last_transaction_id: Option<TransactionId>,
}

impl AccountState {
    /// Builds the initial state from a creation event.
    pub fn from_created(account_id: AccountId, data: &AccountCreatedData) -> Self {
        Self {
            account_id,
            asset_type: data.asset_type,
            status: AccountStatus::Active,
            balance: data.initial_balance,
            min_balance: data.min_balance,
            max_balance: data.max_balance,
            currency: data.currency.clone(),
            owner_id: data.owner_id.clone(),
            version: Version::initial(),
            last_operator_id: None,
            last_transaction_id: None,
        }
    }

    /// Folds one event into the state.
    ///
    /// Pure transition: given the same state and event it always produces
    /// the same new state, and it never fails. Events are facts that have
    /// already happened.
    pub fn apply(&mut self, event: &AccountEvent) {
        match event {
            AccountEvent::AccountCreated(data) => self.apply_created(data),
            AccountEvent::BalanceChanged(data) => self.apply_balance_changed(data),
            AccountEvent::TransferInitiated(data) => self.apply_transfer_initiated(data),
            AccountEvent::TransferCompleted(data) => {
                self.last_transaction_id = Some(data.transaction_id.clone());
            }
            AccountEvent::AccountFrozen(_) => {
                self.status = AccountStatus::Frozen;
            }
            AccountEvent::AccountUnfrozen(_) => {
                self.status = AccountStatus::Active;
            }
            AccountEvent::AccountClosed(_) => {
                self.status = AccountStatus::Closed;
            }
        }
    }

    /// Left-folds a creating event plus its successors into a state.
    ///
    /// Returns `None` when the sequence does not begin with
    /// `AccountCreated`: an account cannot exist without its creation fact.
    pub fn fold<'a>(
        account_id: &AccountId,
        events: impl IntoIterator<Item = &'a AccountEvent>,
    ) -> Option<Self> {
        let mut state: Option<AccountState> = None;
        for event in events {
            match (&mut state, event) {
                (None, AccountEvent::AccountCreated(data)) => {
                    state = Some(AccountState::from_created(account_id.clone(), data));
                }
                (None, _) => return None,
                (Some(s), event) => s.apply(event),
            }
        }
        state
    }

    fn apply_created(&mut self, data: &AccountCreatedData) {
        self.asset_type = data.asset_type;
        self.balance = data.initial_balance;
        self.min_balance = data.min_balance;
        self.max_balance = data.max_balance;
        self.currency = data.currency.clone();
        self.owner_id = data.owner_id.clone();
        self.status = AccountStatus::Active;
    }

    fn apply_balance_changed(&mut self, data: &BalanceChangedData) {
        self.balance += data.amount;
        self.last_transaction_id = Some(data.transaction_id.clone());
    }

    fn apply_transfer_initiated(&mut self, data: &TransferInitiatedData) {
        // Transfer events live on the source account's log; the debit is
        // applied here, the target credit on the target's own log.
        self.balance -= data.amount;
        self.last_transaction_id = Some(data.transaction_id.clone());
    }
}

// Pre-condition checks
impl AccountState {
    /// Checks whether `balance + amount` stays within
    /// `[min_balance, max_balance]` and the account is active.
    ///
    /// Does not mutate. A rejection names the violated invariant with full
    /// context.
    pub fn can_change_balance(&self, amount: Decimal) -> Result<(), AccountError> {
        if !self.status.can_transact() {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: self.status,
                operation: "change balance of",
            });
        }

        let new_balance = self.balance + amount;
        if new_balance < self.min_balance {
            return Err(AccountError::InsufficientBalance {
                account_id: self.account_id.clone(),
                current_balance: self.balance,
                requested_amount: amount.abs(),
                currency: self.currency.clone(),
                transaction_id: None,
            });
        }
        if new_balance > self.max_balance {
            return Err(AccountError::BalanceLimitExceeded {
                account_id: self.account_id.clone(),
                current_balance: self.balance,
                requested_amount: amount,
                max_balance: self.max_balance,
            });
        }
        Ok(())
    }

    /// Checks whether a transfer of `amount` to `target` is legal:
    /// positive amount, active target, matching asset types, and a legal
    /// debit on this account plus a legal credit on the target.
    pub fn can_transfer(&self, target: &AccountState, amount: Decimal) -> Result<(), AccountError> {
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidArgument {
                reason: "transfer amount must be positive".to_string(),
            });
        }
        if !target.status.is_active() {
            return Err(AccountError::InvalidStatus {
                account_id: target.account_id.clone(),
                status: target.status,
                operation: "receive a transfer into",
            });
        }
        if target.asset_type != self.asset_type {
            return Err(AccountError::InvalidArgument {
                reason: format!(
                    "cannot transfer between asset types {} and {}",
                    self.asset_type, target.asset_type
                ),
            });
        }
        self.can_change_balance(-amount)?;
        target.can_change_balance(amount)?;
        Ok(())
    }

    /// Returns true if the balance invariant holds for the current status.
    pub fn invariant_holds(&self) -> bool {
        if self.status.is_closed() {
            self.balance == Decimal::ZERO
        } else {
            self.min_balance <= self.balance && self.balance <= self.max_balance
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_frozen(&self) -> bool {
        self.status.is_frozen()
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn created(initial: i64, min: i64, max: i64) -> AccountState {
        AccountState::from_created(
            AccountId::new("ACC-001"),
            &AccountCreatedData {
                owner_id: "alice".to_string(),
                currency: "USD".to_string(),
                asset_type: AssetType::Fiat,
                initial_balance: Decimal::from(initial),
                min_balance: Decimal::from(min),
                max_balance: Decimal::from(max),
            },
        )
    }

    #[test]
    fn creation_yields_active_state() {
        let state = created(100, 0, 1000);
        assert_eq!(state.status, AccountStatus::Active);
        assert_eq!(state.balance, Decimal::from(100));
        assert_eq!(state.currency, "USD");
        assert!(state.invariant_holds());
    }

    #[test]
    fn balance_changed_moves_balance_and_transaction_id() {
        let mut state = created(100, 0, 1000);
        state.apply(&AccountEvent::balance_changed(
            Decimal::from(-30),
            TransactionId::new("TX-1"),
            None,
        ));

        assert_eq!(state.balance, Decimal::from(70));
        assert_eq!(state.last_transaction_id, Some(TransactionId::new("TX-1")));
    }

    #[test]
    fn transfer_initiated_debits_source() {
        let mut state = created(100, 0, 1000);
        state.apply(&AccountEvent::transfer_initiated(
            AccountId::new("ACC-002"),
            Decimal::from(40),
            TransactionId::new("TX-2"),
            "rent",
        ));
        state.apply(&AccountEvent::transfer_completed(
            AccountId::new("ACC-002"),
            Decimal::from(40),
            TransactionId::new("TX-2"),
        ));

        assert_eq!(state.balance, Decimal::from(60));
        assert_eq!(state.last_transaction_id, Some(TransactionId::new("TX-2")));
    }

    #[test]
    fn freeze_unfreeze_close_transitions() {
        let mut state = created(0, 0, 1000);

        state.apply(&AccountEvent::account_frozen("fraud"));
        assert_eq!(state.status, AccountStatus::Frozen);

        state.apply(&AccountEvent::account_unfrozen("cleared"));
        assert_eq!(state.status, AccountStatus::Active);

        state.apply(&AccountEvent::account_closed("done", Decimal::ZERO));
        assert_eq!(state.status, AccountStatus::Closed);
        assert!(state.invariant_holds());
    }

    #[test]
    fn can_change_balance_within_bounds() {
        let state = created(100, 0, 1000);
        assert!(state.can_change_balance(Decimal::from(900)).is_ok());
        assert!(state.can_change_balance(Decimal::from(-100)).is_ok());
    }

    #[test]
    fn can_change_balance_rejects_below_minimum() {
        let state = created(100, 0, 1000);
        let err = state.can_change_balance(Decimal::from(-150)).unwrap_err();
        match err {
            AccountError::InsufficientBalance {
                current_balance,
                requested_amount,
                currency,
                ..
            } => {
                assert_eq!(current_balance, Decimal::from(100));
                assert_eq!(requested_amount, Decimal::from(150));
                assert_eq!(currency, "USD");
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }

    #[test]
    fn can_change_balance_rejects_above_maximum() {
        let state = created(100, 0, 1000);
        let err = state.can_change_balance(Decimal::from(901)).unwrap_err();
        assert!(matches!(err, AccountError::BalanceLimitExceeded { .. }));
    }

    #[test]
    fn can_change_balance_rejects_frozen_account() {
        let mut state = created(100, 0, 1000);
        state.apply(&AccountEvent::account_frozen("fraud"));

        let err = state.can_change_balance(Decimal::from(10)).unwrap_err();
        assert!(matches!(err, AccountError::InvalidStatus { .. }));
    }

    #[test]
    fn can_transfer_checks_both_sides() {
        let source = created(100, 0, 1000);
        let mut target = created(0, 0, 1000);
        target.account_id = AccountId::new("ACC-002");

        assert!(source.can_transfer(&target, Decimal::from(50)).is_ok());

        // Target over its maximum.
        target.max_balance = Decimal::from(40);
        let err = source.can_transfer(&target, Decimal::from(50)).unwrap_err();
        assert!(matches!(err, AccountError::BalanceLimitExceeded { .. }));

        // Non-positive amounts.
        target.max_balance = Decimal::from(1000);
        let err = source.can_transfer(&target, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AccountError::InvalidArgument { .. }));
    }

    #[test]
    fn can_transfer_rejects_asset_type_mismatch() {
        let source = created(100, 0, 1000);
        let mut target = created(0, 0, 1000);
        target.account_id = AccountId::new("ACC-002");
        target.asset_type = AssetType::Crypto;

        let err = source.can_transfer(&target, Decimal::from(10)).unwrap_err();
        assert!(matches!(err, AccountError::InvalidArgument { .. }));
    }

    #[test]
    fn can_transfer_rejects_inactive_target() {
        let source = created(100, 0, 1000);
        let mut target = created(0, 0, 1000);
        target.account_id = AccountId::new("ACC-002");
        target.apply(&AccountEvent::account_frozen("fraud"));

        let err = source.can_transfer(&target, Decimal::from(10)).unwrap_err();
        match err {
            AccountError::InvalidStatus { account_id, .. } => {
                assert_eq!(account_id, AccountId::new("ACC-002"));
            }
            other => panic!("expected InvalidStatus, got {other:?}"),
        }
    }

    #[test]
    fn fold_requires_creation_first() {
        let account_id = AccountId::new("ACC-001");
        let events = vec![AccountEvent::account_frozen("fraud")];
        assert!(AccountState::fold(&account_id, &events).is_none());
        assert!(AccountState::fold(&account_id, &[]).is_none());
    }

    #[test]
    fn fold_matches_incremental_apply() {
        let account_id = AccountId::new("ACC-001");
        let events = vec![
            AccountEvent::account_created(
                "alice",
                "USD",
                AssetType::Fiat,
                Decimal::from(100),
                Decimal::ZERO,
                Decimal::from(1000),
            ),
            AccountEvent::balance_changed(Decimal::from(25), TransactionId::new("TX-1"), None),
            AccountEvent::balance_changed(Decimal::from(-50), TransactionId::new("TX-2"), None),
        ];

        let folded = AccountState::fold(&account_id, &events).unwrap();
        assert_eq!(folded.balance, Decimal::from(75));
        assert_eq!(folded.last_transaction_id, Some(TransactionId::new("TX-2")));
    }

    proptest! {
        /// Replaying the same event list twice yields identical state.
        #[test]
        fn fold_is_deterministic(amounts in proptest::collection::vec(-1000i64..1000, 0..50)) {
            let account_id = AccountId::new("ACC-PROP");
            let mut events = vec![AccountEvent::account_created(
                "alice",
                "USD",
                AssetType::Fiat,
                Decimal::ZERO,
                Decimal::from(-1_000_000),
                Decimal::from(1_000_000),
            )];
            for (i, amount) in amounts.iter().enumerate() {
                events.push(AccountEvent::balance_changed(
                    Decimal::from(*amount),
                    TransactionId::new(format!("TX-{i}")),
                    None,
                ));
            }

            let first = AccountState::fold(&account_id, &events).unwrap();
            let second = AccountState::fold(&account_id, &events).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Applying only movements that pass `can_change_balance` keeps the
        /// balance invariant after every fold step.
        #[test]
        fn guarded_changes_preserve_invariant(amounts in proptest::collection::vec(-500i64..500, 0..50)) {
            let mut state = AccountState::from_created(
                AccountId::new("ACC-PROP"),
                &AccountCreatedData {
                    owner_id: "alice".to_string(),
                    currency: "USD".to_string(),
                    asset_type: AssetType::Fiat,
                    initial_balance: Decimal::from(100),
                    min_balance: Decimal::ZERO,
                    max_balance: Decimal::from(1000),
                },
            );

            for (i, amount) in amounts.iter().enumerate() {
                let amount = Decimal::from(*amount);
                if state.can_change_balance(amount).is_ok() {
                    state.apply(&AccountEvent::balance_changed(
                        amount,
                        TransactionId::new(format!("TX-{i}")),
                        None,
                    ));
                }
                prop_assert!(state.invariant_holds());
            }
        }
    }
}
