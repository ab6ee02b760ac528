use bitflags::bitflags;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::crypto::{sha256, Hash};

bitflags! {
    /// Behavior flags of a token
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TokenFlags: u32 {
        /// Balances are divisible amounts; absent means NFT semantics
        const FUNGIBLE = 1 << 0;
        /// Total supply is bounded by `max_supply`
        const CAPPED = 1 << 1;
        /// Holders may move the token between accounts
        const TRANSFERABLE = 1 << 2;
        /// Holders may burn units they own
        const BURNABLE = 1 << 3;
    }
}

/// Compute a token identifier from its symbol
pub fn token_id(symbol: &str) -> Hash {
    sha256(symbol.as_bytes())
}

/// The token collaborator consumed by the engine.
///
/// Token definitions live outside the core; the engine only queries flags
/// and supply bounds and asks non-fungible tokens for fresh instance
/// identifiers.
pub trait Token: Send + Sync {
    /// Unique token identifier
    fn id(&self) -> Hash;

    fn flags(&self) -> TokenFlags;

    /// Supply ceiling; meaningful only for capped tokens
    fn max_supply(&self) -> u64;

    /// Produce a fresh instance identifier, monotonic and never reused
    fn generate_id(&self) -> u64;

    fn is_fungible(&self) -> bool {
        self.flags().contains(TokenFlags::FUNGIBLE)
    }

    fn is_capped(&self) -> bool {
        self.flags().contains(TokenFlags::CAPPED)
    }
}

/// A plain token definition backed by an atomic instance counter
#[derive(Debug)]
pub struct TokenMeta {
    id: Hash,
    symbol: String,
    flags: TokenFlags,
    max_supply: u64,
    next_instance: AtomicU64,
}

impl TokenMeta {
    pub fn new(symbol: &str, flags: TokenFlags, max_supply: u64) -> Self {
        TokenMeta {
            id: token_id(symbol),
            symbol: symbol.to_string(),
            flags,
            max_supply,
            next_instance: AtomicU64::new(1),
        }
    }

    /// A fungible token with a hard supply cap
    pub fn capped(symbol: &str, max_supply: u64) -> Self {
        Self::new(
            symbol,
            TokenFlags::FUNGIBLE | TokenFlags::CAPPED | TokenFlags::TRANSFERABLE,
            max_supply,
        )
    }

    /// A non-fungible token
    pub fn non_fungible(symbol: &str) -> Self {
        Self::new(symbol, TokenFlags::TRANSFERABLE, 0)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Unique token identifier, also reachable through the `Token` trait
    pub fn id(&self) -> Hash {
        self.id
    }
}

impl Token for TokenMeta {
    fn id(&self) -> Hash {
        self.id
    }

    fn flags(&self) -> TokenFlags {
        self.flags
    }

    fn max_supply(&self) -> u64 {
        self.max_supply
    }

    fn generate_id(&self) -> u64 {
        self.next_instance.fetch_add(1, Ordering::SeqCst)
    }
}
