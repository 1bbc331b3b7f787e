//! Domain layer for the ledger command core.
//!
//! This crate holds the account aggregate: the closed event and command sum
//! types, the pure state-transition fold, the pre-condition checks, and the
//! typed validation errors. Everything here is deterministic and free of
//! I/O; persistence and orchestration live in the `event-store` and
//! `processor` crates.

pub mod account;
pub mod error;

pub use account::{
    AccountCommand, AccountEvent, AccountState, AccountStatus, AssetType, ChangeBalance,
    CloseAccount, CreateAccount, FreezeAccount, Transfer, UnfreezeAccount,
};
pub use common::{AccountId, TransactionId};
pub use error::AccountError;
