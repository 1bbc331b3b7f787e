//! Account status machine.

use serde::{Deserialize, Serialize};

/// The status of an account in its lifecycle.
///
/// Status transitions:
/// ```text
/// Active ◄──────► Frozen
///    │
///    └──► Closed
/// ```
///
/// `Closed` is terminal; a closed account's event history remains permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccountStatus {
    /// Account can perform balance changes and transfers.
    #[default]
    Active,

    /// Account is frozen; no balance movements until unfrozen.
    Frozen,

    /// Account is closed (terminal state).
    Closed,
}

impl AccountStatus {
    /// Returns true if balance movements are allowed in this status.
    pub fn can_transact(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Returns true if the account can be frozen in this status.
    pub fn can_freeze(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Returns true if the account can be unfrozen in this status.
    pub fn can_unfreeze(&self) -> bool {
        matches!(self, AccountStatus::Frozen)
    }

    /// Returns true if the account can be closed in this status.
    ///
    /// Frozen accounts must be unfrozen first; the zero-balance requirement
    /// is checked separately.
    pub fn can_close(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AccountStatus::Closed)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, AccountStatus::Frozen)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, AccountStatus::Closed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Frozen => "Frozen",
            AccountStatus::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
