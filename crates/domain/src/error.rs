//! Typed validation errors for account operations.

use common::{AccountId, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountStatus;

/// Errors produced by command validation and aggregate pre-condition checks.
///
/// Every rejection identifies the invariant that failed and carries enough
/// context to be surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccountError {
    /// No account exists at this id.
    #[error("Account not found: {account_id}")]
    NotFound { account_id: AccountId },

    /// An account already exists at this id.
    #[error("Account already exists: {account_id}")]
    AlreadyExists { account_id: AccountId },

    /// A command field is malformed.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The requested debit would take the balance below the minimum.
    #[error(
        "Insufficient balance in account {account_id}: current {current_balance} {currency}, requested {requested_amount} {currency}"
    )]
    InsufficientBalance {
        account_id: AccountId,
        current_balance: Decimal,
        requested_amount: Decimal,
        currency: String,
        transaction_id: Option<TransactionId>,
    },

    /// The requested credit would take the balance above the maximum.
    #[error(
        "Balance limit exceeded for account {account_id}: current {current_balance}, requested {requested_amount}, maximum {max_balance}"
    )]
    BalanceLimitExceeded {
        account_id: AccountId,
        current_balance: Decimal,
        requested_amount: Decimal,
        max_balance: Decimal,
    },

    /// The operation is not legal in the account's current status.
    #[error("Cannot {operation} account {account_id} in status {status}")]
    InvalidStatus {
        account_id: AccountId,
        status: AccountStatus,
        operation: &'static str,
    },
}
