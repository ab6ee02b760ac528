use serde::{Deserialize, Serialize};
use tessera_core::{serialize, Hash};
use tracing::debug;

use crate::error::StateError;
use crate::keys;
use crate::storage::Storage;

/// Supply record of a capped fungible token on one chain.
///
/// `local` is the amount resident on this chain, `circulating` the amount
/// minted into balances here. Invariant on every operation:
/// `circulating <= local <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub local: u64,
    pub circulating: u64,
    pub max: u64,
}

impl Supply {
    /// Fresh sheet on a root chain: nothing resident, nothing minted
    pub fn root(max: u64) -> Self {
        Supply {
            local: 0,
            circulating: 0,
            max,
        }
    }

    /// Sheet materialized on a child chain by borrowing from its parent:
    /// the parent's resident amount becomes the child's ceiling.
    pub fn borrowed(parent: &Supply) -> Self {
        Supply {
            local: parent.local,
            circulating: 0,
            max: parent.max,
        }
    }

    fn check(&self) -> Result<(), StateError> {
        if self.circulating <= self.local && self.local <= self.max {
            Ok(())
        } else {
            Err(StateError::SupplyInvariant)
        }
    }

    /// Mint into circulation, bounded by the resident amount
    pub fn mint(&mut self, amount: u64) -> Result<(), StateError> {
        let available = self.local - self.circulating;
        if amount > available {
            return Err(StateError::SupplyExhausted {
                requested: amount,
                available,
            });
        }
        self.circulating += amount;
        self.check()
    }

    /// Remove from circulation
    pub fn burn(&mut self, amount: u64) -> Result<(), StateError> {
        if amount > self.circulating {
            return Err(StateError::SupplyUnderflow {
                requested: amount,
                circulating: self.circulating,
            });
        }
        self.circulating -= amount;
        self.check()
    }

    /// Issue fresh resident supply, bounded by the cap. Root chains call
    /// this before minting; children never do (their ceiling is borrowed).
    pub fn raise_local(&mut self, amount: u64) -> Result<(), StateError> {
        let updated = self
            .local
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow)?;
        if updated > self.max {
            return Err(StateError::SupplyCapExceeded { max: self.max });
        }
        self.local = updated;
        self.check()
    }

    /// Retire resident supply; cannot drop below what is circulating
    pub fn lower_local(&mut self, amount: u64) -> Result<(), StateError> {
        if self.local.saturating_sub(amount) < self.circulating {
            return Err(StateError::SupplyInvariant);
        }
        self.local -= amount;
        self.check()
    }
}

/// Storage-backed view over a token's supply record
#[derive(Debug, Clone, Copy)]
pub struct SupplySheet {
    token: Hash,
}

impl SupplySheet {
    pub fn new(token: Hash) -> Self {
        SupplySheet { token }
    }

    pub fn key(&self) -> Vec<u8> {
        keys::scoped(keys::SUPPLY, self.token.as_bytes(), &[])
    }

    pub fn load(&self, store: &dyn Storage) -> Result<Option<Supply>, StateError> {
        match store.get(&self.key()) {
            Some(bytes) => Ok(Some(serialize::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, store: &mut dyn Storage, supply: &Supply) -> Result<(), StateError> {
        store.put(&self.key(), &serialize::to_bytes(supply)?);
        Ok(())
    }

    /// Create the sheet; fails if one already exists
    pub fn init(&self, store: &mut dyn Storage, supply: Supply) -> Result<(), StateError> {
        if store.contains(&self.key()) {
            return Err(StateError::SupplyExists);
        }
        self.save(store, &supply)?;
        debug!(token = %self.token, max = supply.max, local = supply.local, "supply sheet created");
        Ok(())
    }
}
