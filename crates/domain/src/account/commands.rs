//! Account commands and their validation/execution rules.
//!
//! Commands are immutable intents. `validate` and `execute` are pure
//! functions of the supplied state; `execute` re-runs validation internally
//! because the state may have been reloaded between the two calls.

use common::{AccountId, TransactionId};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AccountError;

use super::{AccountEvent, AccountState, AssetType};

/// Command to create a new account.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    /// Deduplication id for this command.
    pub command_id: String,

    /// The account id to create.
    pub account_id: AccountId,

    /// Operator submitting the command.
    pub operator_id: String,

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

impl CreateAccount {
    /// Creates a new CreateAccount command with a generated command id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: AccountId,
        operator_id: impl Into<String>,
        owner_id: impl Into<String>,
        currency: impl Into<String>,
        asset_type: AssetType,
        initial_balance: Decimal,
        min_balance: Decimal,
        max_balance: Decimal,
    ) -> Self {
        Self {
            command_id: Uuid::new_v4().to_string(),
            account_id,
            operator_id: operator_id.into(),
            owner_id: owner_id.into(),
            currency: currency.into(),
            asset_type,
            initial_balance,
            min_balance,
            max_balance,
        }
    }

    /// Validates the command against the current state.
    ///
    /// `state` is `None` when the account has no history.
    pub fn validate(&self, state: Option<&AccountState>) -> Result<(), AccountError> {
        if state.is_some() {
            return Err(AccountError::AlreadyExists {
                account_id: self.account_id.clone(),
            });
        }
        if self.initial_balance < Decimal::ZERO {
            return Err(AccountError::InvalidArgument {
                reason: "initial balance must be non-negative".to_string(),
            });
        }
        if self.min_balance > self.max_balance {
            return Err(AccountError::InvalidArgument {
                reason: "min balance must be less than or equal to max balance".to_string(),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(AccountError::InvalidArgument {
                reason: "currency must not be empty".to_string(),
            });
        }
        if self.owner_id.trim().is_empty() {
            return Err(AccountError::InvalidArgument {
                reason: "owner id must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Produces the creation event.
    pub fn execute(&self, state: Option<&AccountState>) -> Result<Vec<AccountEvent>, AccountError> {
        self.validate(state)?;
        Ok(vec![AccountEvent::account_created(
            self.owner_id.clone(),
            self.currency.clone(),
            self.asset_type,
            self.initial_balance,
            self.min_balance,
            self.max_balance,
        )])
    }
}

/// Command to change an account's balance.
///
/// A positive amount credits the account, a negative amount debits it.
#[derive(Debug, Clone)]
pub struct ChangeBalance {
    /// Deduplication id for this command.
    pub command_id: String,

    /// The account whose balance changes.
    pub account_id: AccountId,

    /// Operator submitting the command.
    pub operator_id: String,

    /// Signed amount to apply.
    pub amount: Decimal,

    /// The external transaction this movement belongs to.
    pub transaction_id: TransactionId,

    /// Counterparty account, when this movement is one leg of a transfer.
    pub target_account_id: Option<AccountId>,
}

impl ChangeBalance {
    /// Creates a new ChangeBalance command with a generated command id.
    pub fn new(
        account_id: AccountId,
        operator_id: impl Into<String>,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Self {
        Self {
            command_id: Uuid::new_v4().to_string(),
            account_id,
            operator_id: operator_id.into(),
            amount,
            transaction_id,
            target_account_id: None,
        }
    }

    /// Validates the command against the current state.
    pub fn validate(&self, state: Option<&AccountState>) -> Result<(), AccountError> {
        let state = state.ok_or_else(|| AccountError::NotFound {
            account_id: self.account_id.clone(),
        })?;

        if !state.status.can_transact() {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: state.status,
                operation: "change balance of",
            });
        }
        if self.transaction_id.is_blank() {
            return Err(AccountError::InvalidArgument {
                reason: "transaction id must not be empty".to_string(),
            });
        }

        let new_balance = state.balance + self.amount;
        if new_balance < state.min_balance {
            return Err(AccountError::InsufficientBalance {
                account_id: self.account_id.clone(),
                current_balance: state.balance,
                requested_amount: self.amount.abs(),
                currency: state.currency.clone(),
                transaction_id: Some(self.transaction_id.clone()),
            });
        }
        if new_balance > state.max_balance {
            return Err(AccountError::BalanceLimitExceeded {
                account_id: self.account_id.clone(),
                current_balance: state.balance,
                requested_amount: self.amount,
                max_balance: state.max_balance,
            });
        }
        Ok(())
    }

    /// Produces the balance movement event.
    pub fn execute(&self, state: Option<&AccountState>) -> Result<Vec<AccountEvent>, AccountError> {
        self.validate(state)?;
        Ok(vec![AccountEvent::balance_changed(
            self.amount,
            self.transaction_id.clone(),
            self.target_account_id.clone(),
        )])
    }
}

/// Command to transfer funds from this account to another.
///
/// The produced events are scoped to the source account's log; the credit to
/// the target account travels as a separate `ChangeBalance` command against
/// the target's own log, carrying the same transaction id.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Deduplication id for this command.
    pub command_id: String,

    /// Source account (debited).
    pub account_id: AccountId,

    /// Operator submitting the command.
    pub operator_id: String,

    /// Target account (credited by the follow-up command).
    pub target_account_id: AccountId,

    /// Amount to transfer; must be positive.
    pub amount: Decimal,

    /// The external transaction correlating both legs.
    pub transaction_id: TransactionId,

    /// Caller-supplied description.
    pub description: String,
}

impl Transfer {
    /// Creates a new Transfer command with a generated command id.
    pub fn new(
        account_id: AccountId,
        target_account_id: AccountId,
        operator_id: impl Into<String>,
        amount: Decimal,
        transaction_id: TransactionId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            command_id: Uuid::new_v4().to_string(),
            account_id,
            operator_id: operator_id.into(),
            target_account_id,
            amount,
            transaction_id,
            description: description.into(),
        }
    }

    /// Validates the source-side rules against the current state.
    ///
    /// Target-side rules (`can_transfer`) need the target account's state
    /// and are checked by the command processor before execution.
    pub fn validate(&self, state: Option<&AccountState>) -> Result<(), AccountError> {
        let state = state.ok_or_else(|| AccountError::NotFound {
            account_id: self.account_id.clone(),
        })?;

        if !state.status.can_transact() {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: state.status,
                operation: "transfer out of",
            });
        }
        if self.target_account_id.is_blank() {
            return Err(AccountError::InvalidArgument {
                reason: "target account id must not be empty".to_string(),
            });
        }
        if self.amount <= Decimal::ZERO {
            return Err(AccountError::InvalidArgument {
                reason: "transfer amount must be positive".to_string(),
            });
        }
        if self.amount > state.balance {
            return Err(AccountError::InsufficientBalance {
                account_id: self.account_id.clone(),
                current_balance: state.balance,
                requested_amount: self.amount,
                currency: state.currency.clone(),
                transaction_id: Some(self.transaction_id.clone()),
            });
        }
        if self.transaction_id.is_blank() {
            return Err(AccountError::InvalidArgument {
                reason: "transaction id must not be empty".to_string(),
            });
        }
        if self.description.trim().is_empty() {
            return Err(AccountError::InvalidArgument {
                reason: "description must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Produces the transfer batch: initiation followed by completion, both
    /// on the source account's log, appended together so neither is ever
    /// observed without the other.
    pub fn execute(&self, state: Option<&AccountState>) -> Result<Vec<AccountEvent>, AccountError> {
        self.validate(state)?;
        Ok(vec![
            AccountEvent::transfer_initiated(
                self.target_account_id.clone(),
                self.amount,
                self.transaction_id.clone(),
                self.description.clone(),
            ),
            AccountEvent::transfer_completed(
                self.target_account_id.clone(),
                self.amount,
                self.transaction_id.clone(),
            ),
        ])
    }
}

/// Command to freeze an account.
#[derive(Debug, Clone)]
pub struct FreezeAccount {
    /// Deduplication id for this command.
    pub command_id: String,

    /// The account to freeze.
    pub account_id: AccountId,

    /// Operator submitting the command.
    pub operator_id: String,

    /// Why the account is being frozen.
    pub reason: String,
}

impl FreezeAccount {
    /// Creates a new FreezeAccount command with a generated command id.
    pub fn new(
        account_id: AccountId,
        operator_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            command_id: Uuid::new_v4().to_string(),
            account_id,
            operator_id: operator_id.into(),
            reason: reason.into(),
        }
    }

    /// Validates the command against the current state.
    pub fn validate(&self, state: Option<&AccountState>) -> Result<(), AccountError> {
        let state = state.ok_or_else(|| AccountError::NotFound {
            account_id: self.account_id.clone(),
        })?;

        if !state.status.can_freeze() {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: state.status,
                operation: "freeze",
            });
        }
        if self.reason.trim().is_empty() {
            return Err(AccountError::InvalidArgument {
                reason: "freeze reason must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Produces the freeze event.
    pub fn execute(&self, state: Option<&AccountState>) -> Result<Vec<AccountEvent>, AccountError> {
        self.validate(state)?;
        Ok(vec![AccountEvent::account_frozen(self.reason.clone())])
    }
}

/// Command to unfreeze a frozen account.
#[derive(Debug, Clone)]
pub struct UnfreezeAccount {
    /// Deduplication id for this command.
    pub command_id: String,

    /// The account to unfreeze.
    pub account_id: AccountId,

    /// Operator submitting the command.
    pub operator_id: String,

    /// Why the account is being unfrozen.
    pub reason: String,
}

impl UnfreezeAccount {
    /// Creates a new UnfreezeAccount command with a generated command id.
    pub fn new(
        account_id: AccountId,
        operator_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            command_id: Uuid::new_v4().to_string(),
            account_id,
            operator_id: operator_id.into(),
            reason: reason.into(),
        }
    }

    /// Validates the command against the current state.
    pub fn validate(&self, state: Option<&AccountState>) -> Result<(), AccountError> {
        let state = state.ok_or_else(|| AccountError::NotFound {
            account_id: self.account_id.clone(),
        })?;

        if !state.status.can_unfreeze() {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: state.status,
                operation: "unfreeze",
            });
        }
        if self.reason.trim().is_empty() {
            return Err(AccountError::InvalidArgument {
                reason: "unfreeze reason must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Produces the unfreeze event.
    pub fn execute(&self, state: Option<&AccountState>) -> Result<Vec<AccountEvent>, AccountError> {
        self.validate(state)?;
        Ok(vec![AccountEvent::account_unfrozen(self.reason.clone())])
    }
}

/// Command to close an account.
///
/// The account must be active with zero balance; a frozen account must be
/// unfrozen first. Closing is terminal; the event history remains.
#[derive(Debug, Clone)]
pub struct CloseAccount {
    /// Deduplication id for this command.
    pub command_id: String,

    /// The account to close.
    pub account_id: AccountId,

    /// Operator submitting the command.
    pub operator_id: String,

    /// Why the account is being closed.
    pub reason: String,
}

impl CloseAccount {
    /// Creates a new CloseAccount command with a generated command id.
    pub fn new(
        account_id: AccountId,
        operator_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            command_id: Uuid::new_v4().to_string(),
            account_id,
            operator_id: operator_id.into(),
            reason: reason.into(),
        }
    }

    /// Validates the command against the current state.
    pub fn validate(&self, state: Option<&AccountState>) -> Result<(), AccountError> {
        let state = state.ok_or_else(|| AccountError::NotFound {
            account_id: self.account_id.clone(),
        })?;

        if state.status.is_closed() {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: state.status,
                operation: "close",
            });
        }
        if state.status.is_frozen() {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: state.status,
                operation: "close",
            });
        }
        if state.balance != Decimal::ZERO {
            return Err(AccountError::InvalidStatus {
                account_id: self.account_id.clone(),
                status: state.status,
                operation: "close (balance must be zero)",
            });
        }
        Ok(())
    }

    /// Produces the close event carrying the final balance.
    pub fn execute(&self, state: Option<&AccountState>) -> Result<Vec<AccountEvent>, AccountError> {
        self.validate(state)?;
        let final_balance = state.map(|s| s.balance).unwrap_or(Decimal::ZERO);
        Ok(vec![AccountEvent::account_closed(
            self.reason.clone(),
            final_balance,
        )])
    }
}

/// All commands the account aggregate understands.
///
/// Closed sum type, matched exhaustively: a new command variant is a
/// compile-time-checked change everywhere it is routed.
#[derive(Debug, Clone)]
pub enum AccountCommand {
    CreateAccount(CreateAccount),
    ChangeBalance(ChangeBalance),
    Transfer(Transfer),
    FreezeAccount(FreezeAccount),
    UnfreezeAccount(UnfreezeAccount),
    CloseAccount(CloseAccount),
}

impl AccountCommand {
    /// Returns the command type tag, used as half of the idempotency key.
    pub fn command_type(&self) -> &'static str {
        match self {
            AccountCommand::CreateAccount(_) => "CreateAccount",
            AccountCommand::ChangeBalance(_) => "ChangeBalance",
            AccountCommand::Transfer(_) => "Transfer",
            AccountCommand::FreezeAccount(_) => "FreezeAccount",
            AccountCommand::UnfreezeAccount(_) => "UnfreezeAccount",
            AccountCommand::CloseAccount(_) => "CloseAccount",
        }
    }

    /// Returns the command's deduplication id.
    pub fn command_id(&self) -> &str {
        match self {
            AccountCommand::CreateAccount(c) => &c.command_id,
            AccountCommand::ChangeBalance(c) => &c.command_id,
            AccountCommand::Transfer(c) => &c.command_id,
            AccountCommand::FreezeAccount(c) => &c.command_id,
            AccountCommand::UnfreezeAccount(c) => &c.command_id,
            AccountCommand::CloseAccount(c) => &c.command_id,
        }
    }

    /// Returns the account this command targets.
    pub fn account_id(&self) -> &AccountId {
        match self {
            AccountCommand::CreateAccount(c) => &c.account_id,
            AccountCommand::ChangeBalance(c) => &c.account_id,
            AccountCommand::Transfer(c) => &c.account_id,
            AccountCommand::FreezeAccount(c) => &c.account_id,
            AccountCommand::UnfreezeAccount(c) => &c.account_id,
            AccountCommand::CloseAccount(c) => &c.account_id,
        }
    }

    /// Returns the operator submitting this command.
    pub fn operator_id(&self) -> &str {
        match self {
            AccountCommand::CreateAccount(c) => &c.operator_id,
            AccountCommand::ChangeBalance(c) => &c.operator_id,
            AccountCommand::Transfer(c) => &c.operator_id,
            AccountCommand::FreezeAccount(c) => &c.operator_id,
            AccountCommand::UnfreezeAccount(c) => &c.operator_id,
            AccountCommand::CloseAccount(c) => &c.operator_id,
        }
    }

    /// Returns the transfer target, for commands that have one.
    pub fn transfer_target(&self) -> Option<&Transfer> {
        match self {
            AccountCommand::Transfer(c) => Some(c),
            _ => None,
        }
    }

    /// Validates the command against the current state.
    pub fn validate(&self, state: Option<&AccountState>) -> Result<(), AccountError> {
        match self {
            AccountCommand::CreateAccount(c) => c.validate(state),
            AccountCommand::ChangeBalance(c) => c.validate(state),
            AccountCommand::Transfer(c) => c.validate(state),
            AccountCommand::FreezeAccount(c) => c.validate(state),
            AccountCommand::UnfreezeAccount(c) => c.validate(state),
            AccountCommand::CloseAccount(c) => c.validate(state),
        }
    }

    /// Executes the command, producing the ordered event batch.
    pub fn execute(&self, state: Option<&AccountState>) -> Result<Vec<AccountEvent>, AccountError> {
        match self {
            AccountCommand::CreateAccount(c) => c.execute(state),
            AccountCommand::ChangeBalance(c) => c.execute(state),
            AccountCommand::Transfer(c) => c.execute(state),
            AccountCommand::FreezeAccount(c) => c.execute(state),
            AccountCommand::UnfreezeAccount(c) => c.execute(state),
            AccountCommand::CloseAccount(c) => c.execute(state),
        }
    }
}

impl From<CreateAccount> for AccountCommand {
    fn from(c: CreateAccount) -> Self {
        AccountCommand::CreateAccount(c)
    }
}

impl From<ChangeBalance> for AccountCommand {
    fn from(c: ChangeBalance) -> Self {
        AccountCommand::ChangeBalance(c)
    }
}

impl From<Transfer> for AccountCommand {
    fn from(c: Transfer) -> Self {
        AccountCommand::Transfer(c)
    }
}

impl From<FreezeAccount> for AccountCommand {
    fn from(c: FreezeAccount) -> Self {
        AccountCommand::FreezeAccount(c)
    }
}

impl From<UnfreezeAccount> for AccountCommand {
    fn from(c: UnfreezeAccount) -> Self {
        AccountCommand::UnfreezeAccount(c)
    }
}

impl From<CloseAccount> for AccountCommand {
    fn from(c: CloseAccount) -> Self {
        AccountCommand::CloseAccount(c)
    }
}
