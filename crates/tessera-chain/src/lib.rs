//! Tessera Chain - the per-chain ledger engine
//!
//! Ingests blocks, executes their transactions against a staged change-set
//! over the chain's KV store, keeps token ledgers consistent under forward
//! application and rollback, and supports reorganization across a
//! parent/child chain tree.

pub mod block;
pub mod chain;
pub mod error;
pub mod log;
pub mod nexus;
pub mod ops;
pub mod runtime;

pub use block::{Block, ChainQuery, ChainView, Transaction, TxContext};
pub use chain::{validate_name, Chain, ChainConfig};
pub use error::ChainError;
pub use log::BlockLog;
pub use nexus::{Nexus, SoloNexus};
pub use runtime::{ScriptEngine, ValueStack};
