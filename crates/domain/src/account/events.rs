//! Account domain events.

use common::{AccountId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AssetType;

/// Events that can occur on an account.
///
/// This is a closed sum type: every consumer matches it exhaustively, so
/// adding a variant is a compile-time-checked change. Events are immutable
/// facts named in past tense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AccountEvent {
    /// Account was created.
    AccountCreated(AccountCreatedData),

    /// Balance was credited (positive amount) or debited (negative amount).
    BalanceChanged(BalanceChangedData),

    /// A transfer out of this account was initiated.
    TransferInitiated(TransferInitiatedData),

    /// A transfer out of this account completed.
    TransferCompleted(TransferCompletedData),

    /// Account was frozen.
    AccountFrozen(AccountFrozenData),

    /// Account was unfrozen.
    AccountUnfrozen(AccountUnfrozenData),

    /// Account was closed.
    AccountClosed(AccountClosedData),
}

/// Data for AccountCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreatedData {
    /// Owner of the new account.
    pub owner_id: String,

    /// Currency the account is denominated in.
    pub currency: String,

    /// Asset class held by the account.
    pub asset_type: AssetType,

    /// Opening balance.
    pub initial_balance: Decimal,

    /// Lower balance bound.
    pub min_balance: Decimal,

    /// Upper balance bound.
    pub max_balance: Decimal,
}

/// Data for BalanceChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceChangedData {
    /// Signed amount: positive credits, negative debits.
    pub amount: Decimal,

    /// The external transaction this movement belongs to.
    pub transaction_id: TransactionId,

    /// Counterparty account, when the movement is one leg of a transfer.
    pub target_account_id: Option<AccountId>,
}

/// Data for TransferInitiated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferInitiatedData {
    /// Account receiving the transfer.
    pub target_account_id: AccountId,

    /// Amount leaving the source account.
    pub amount: Decimal,

    /// The external transaction this transfer belongs to.
    pub transaction_id: TransactionId,

    /// Caller-supplied description.
    pub description: String,
}

/// Data for TransferCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCompletedData {
    /// Account that received the transfer.
    pub target_account_id: AccountId,

    /// Amount transferred.
    pub amount: Decimal,

    /// The external transaction this transfer belongs to.
    pub transaction_id: TransactionId,
}

/// Data for AccountFrozen event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountFrozenData {
    /// Why the account was frozen.
    pub reason: String,
}

/// Data for AccountUnfrozen event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountUnfrozenData {
    /// Why the account was unfrozen.
    pub reason: String,
}

/// Data for AccountClosed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountClosedData {
    /// Why the account was closed.
    pub reason: String,

    /// The balance at close time (always zero for a legal close).
    pub final_balance: Decimal,
}

impl AccountEvent {
    /// Returns the event type tag used for storage and routing.
    pub fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated(_) => "AccountCreated",
            AccountEvent::BalanceChanged(_) => "BalanceChanged",
            AccountEvent::TransferInitiated(_) => "TransferInitiated",
            AccountEvent::TransferCompleted(_) => "TransferCompleted",
            AccountEvent::AccountFrozen(_) => "AccountFrozen",
            AccountEvent::AccountUnfrozen(_) => "AccountUnfrozen",
            AccountEvent::AccountClosed(_) => "AccountClosed",
        }
    }

    /// Returns true if `event_type` names a variant this crate understands.
    ///
    /// Stored events with unrecognized tags are skipped during replay for
    /// forward compatibility.
    pub fn is_known_type(event_type: &str) -> bool {
        matches!(
            event_type,
            "AccountCreated"
                | "BalanceChanged"
                | "TransferInitiated"
                | "TransferCompleted"
                | "AccountFrozen"
                | "AccountUnfrozen"
                | "AccountClosed"
        )
    }
}

// Convenience constructors for events
impl AccountEvent {
    /// Creates an AccountCreated event.
    pub fn account_created(
        owner_id: impl Into<String>,
        currency: impl Into<String>,
        asset_type: AssetType,
        initial_balance: Decimal,
        min_balance: Decimal,
        max_balance: Decimal,
    ) -> Self {
        AccountEvent::AccountCreated(AccountCreatedData {
            owner_id: owner_id.into(),
            currency: currency.into(),
            asset_type,
            initial_balance,
            min_balance,
            max_balance,
        })
    }

    /// Creates a BalanceChanged event.
    pub fn balance_changed(
        amount: Decimal,
        transaction_id: TransactionId,
        target_account_id: Option<AccountId>,
    ) -> Self {
        AccountEvent::BalanceChanged(BalanceChangedData {
            amount,
            transaction_id,
            target_account_id,
        })
    }

    /// Creates a TransferInitiated event.
    pub fn transfer_initiated(
        target_account_id: AccountId,
        amount: Decimal,
        transaction_id: TransactionId,
        description: impl Into<String>,
    ) -> Self {
        AccountEvent::TransferInitiated(TransferInitiatedData {
            target_account_id,
            amount,
            transaction_id,
            description: description.into(),
        })
    }

    /// Creates a TransferCompleted event.
    pub fn transfer_completed(
        target_account_id: AccountId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Self {
        AccountEvent::TransferCompleted(TransferCompletedData {
            target_account_id,
            amount,
            transaction_id,
        })
    }

    /// Creates an AccountFrozen event.
    pub fn account_frozen(reason: impl Into<String>) -> Self {
        AccountEvent::AccountFrozen(AccountFrozenData {
            reason: reason.into(),
        })
    }

    /// Creates an AccountUnfrozen event.
    pub fn account_unfrozen(reason: impl Into<String>) -> Self {
        AccountEvent::AccountUnfrozen(AccountUnfrozenData {
            reason: reason.into(),
        })
    }

    /// Creates an AccountClosed event.
    pub fn account_closed(reason: impl Into<String>, final_balance: Decimal) -> Self {
        AccountEvent::AccountClosed(AccountClosedData {
            reason: reason.into(),
            final_balance,
        })
    }
}
