//! Tessera State - versioned key/value storage and token ledgers
//!
//! The storage backend contract with an in-memory default, the reversible
//! block-scoped change-set, and the per-token ledger sheets (balances,
//! NFT ownership, capped supply) that ride on top of any backend.

pub mod balance;
pub mod changeset;
pub mod error;
pub mod keys;
pub mod nft;
pub mod ownership;
pub mod storage;
pub mod supply;

pub use balance::BalanceSheet;
pub use changeset::{ChangeSet, StagedStore};
pub use error::StateError;
pub use nft::NftRegistry;
pub use ownership::OwnershipSheet;
pub use storage::{MemoryStorage, Storage};
pub use supply::{Supply, SupplySheet};
