use std::collections::BTreeSet;

use tessera_core::{serialize, Address, Hash};
use tracing::debug;

use crate::error::StateError;
use crate::keys;
use crate::storage::Storage;

/// Per-token NFT ownership ledger: address → owned instance ids, plus a
/// reverse index from instance id to its owner.
///
/// Both sides are written through the same store view, so they move
/// together under commit and undo. Every instance id appears in at most
/// one address's set.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipSheet {
    token: Hash,
}

impl OwnershipSheet {
    pub fn new(token: Hash) -> Self {
        OwnershipSheet { token }
    }

    fn forward_key(&self, address: &Address) -> Vec<u8> {
        keys::scoped(keys::OWNERSHIP, self.token.as_bytes(), address.as_bytes())
    }

    fn reverse_key(&self, id: u64) -> Vec<u8> {
        keys::scoped(keys::OWNER_INDEX, self.token.as_bytes(), &id.to_le_bytes())
    }

    /// Instance ids owned by an address; empty if absent
    pub fn get(&self, store: &dyn Storage, address: &Address) -> Result<BTreeSet<u64>, StateError> {
        match store.get(&self.forward_key(address)) {
            Some(bytes) => Ok(serialize::from_bytes(&bytes)?),
            None => Ok(BTreeSet::new()),
        }
    }

    /// Current owner of an instance id, if any
    pub fn owner_of(&self, store: &dyn Storage, id: u64) -> Result<Option<Address>, StateError> {
        match store.get(&self.reverse_key(id)) {
            Some(bytes) => Address::from_slice(&bytes)
                .map(Some)
                .ok_or(StateError::Core(tessera_core::CoreError::InvalidAddress)),
            None => Ok(None),
        }
    }

    fn set(
        &self,
        store: &mut dyn Storage,
        address: &Address,
        owned: &BTreeSet<u64>,
    ) -> Result<(), StateError> {
        let key = self.forward_key(address);
        if owned.is_empty() {
            store.delete(&key);
        } else {
            store.put(&key, &serialize::to_bytes(owned)?);
        }
        Ok(())
    }

    /// Assign an unowned instance id to an address
    pub fn give(
        &self,
        store: &mut dyn Storage,
        address: &Address,
        id: u64,
    ) -> Result<(), StateError> {
        if self.owner_of(store, id)?.is_some() {
            return Err(StateError::NftAlreadyOwned(id));
        }

        let mut owned = self.get(store, address)?;
        owned.insert(id);
        self.set(store, address, &owned)?;
        store.put(&self.reverse_key(id), address.as_bytes());

        debug!(token = %self.token, %address, id, "nft assigned");
        Ok(())
    }

    /// Remove an instance id from the address that holds it
    pub fn take(
        &self,
        store: &mut dyn Storage,
        address: &Address,
        id: u64,
    ) -> Result<(), StateError> {
        if self.owner_of(store, id)? != Some(*address) {
            return Err(StateError::NftNotOwned(id));
        }

        let mut owned = self.get(store, address)?;
        owned.remove(&id);
        self.set(store, address, &owned)?;
        store.delete(&self.reverse_key(id));

        debug!(token = %self.token, %address, id, "nft released");
        Ok(())
    }

    /// Move an instance id between addresses
    pub fn transfer(
        &self,
        store: &mut dyn Storage,
        from: &Address,
        to: &Address,
        id: u64,
    ) -> Result<(), StateError> {
        self.take(store, from, id)?;
        self.give(store, to, id)
    }
}
