//! The account aggregate: status machine, events, state fold, and commands.

pub mod aggregate;
pub mod commands;
pub mod events;
pub mod replay;
pub mod status;
pub mod value_objects;

pub use aggregate::AccountState;
pub use commands::{
    AccountCommand, ChangeBalance, CloseAccount, CreateAccount, FreezeAccount, Transfer,
    UnfreezeAccount,
};
pub use events::AccountEvent;
pub use status::AccountStatus;
pub use value_objects::AssetType;
