//! Tessera Core - foundational types for the tessera chain engine
//!
//! Digests, addresses, token contracts, events, and the host value type
//! shared by the state and chain crates.

pub mod crypto;
pub mod error;
pub mod serialize;
pub mod types;

pub use crypto::{sha256, Hash};
pub use error::CoreError;
pub use types::*;
