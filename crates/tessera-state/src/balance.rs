use tessera_core::{Address, Hash};
use tracing::debug;

use crate::error::StateError;
use crate::keys;
use crate::storage::Storage;

/// Per-token fungible balance ledger, keyed over a chain's KV store.
///
/// The sheet is a stateless view: callers pass the store (or a staged
/// store during block execution, which makes every mutation reversible).
/// Absent keys read as zero; zero balances are pruned.
#[derive(Debug, Clone, Copy)]
pub struct BalanceSheet {
    token: Hash,
}

impl BalanceSheet {
    pub fn new(token: Hash) -> Self {
        BalanceSheet { token }
    }

    fn key(&self, address: &Address) -> Vec<u8> {
        keys::scoped(keys::BALANCE, self.token.as_bytes(), address.as_bytes())
    }

    /// Balance of an address; zero if absent
    pub fn get(&self, store: &dyn Storage, address: &Address) -> u64 {
        match store.get(&self.key(address)) {
            Some(bytes) if bytes.len() == 8 => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                u64::from_le_bytes(arr)
            }
            _ => 0,
        }
    }

    fn set(&self, store: &mut dyn Storage, address: &Address, amount: u64) {
        let key = self.key(address);
        if amount == 0 {
            store.delete(&key);
        } else {
            store.put(&key, &amount.to_le_bytes());
        }
    }

    pub fn add(
        &self,
        store: &mut dyn Storage,
        address: &Address,
        amount: u64,
    ) -> Result<(), StateError> {
        let balance = self.get(store, address);
        let updated = balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow)?;
        self.set(store, address, updated);
        Ok(())
    }

    pub fn subtract(
        &self,
        store: &mut dyn Storage,
        address: &Address,
        amount: u64,
    ) -> Result<(), StateError> {
        let balance = self.get(store, address);
        if balance < amount {
            return Err(StateError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        self.set(store, address, balance - amount);
        Ok(())
    }

    /// Move `amount` between two addresses
    pub fn transfer(
        &self,
        store: &mut dyn Storage,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), StateError> {
        self.subtract(store, from, amount)?;
        self.add(store, to, amount)?;
        debug!(token = %self.token, %from, %to, amount, "balance transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use tessera_core::sha256;

    fn addr(seed: &[u8]) -> Address {
        Address::from_hash(sha256(seed))
    }

    #[test]
    fn test_absent_reads_zero() {
        let store = MemoryStorage::new();
        let sheet = BalanceSheet::new(sha256(b"GOLD"));
        assert_eq!(sheet.get(&store, &addr(b"alice")), 0);
    }

    #[test]
    fn test_add_and_subtract() {
        let mut store = MemoryStorage::new();
        let sheet = BalanceSheet::new(sha256(b"GOLD"));
        let alice = addr(b"alice");

        sheet.add(&mut store, &alice, 100).unwrap();
        assert_eq!(sheet.get(&store, &alice), 100);

        sheet.subtract(&mut store, &alice, 30).unwrap();
        assert_eq!(sheet.get(&store, &alice), 70);
    }

    #[test]
    fn test_subtract_underflow() {
        let mut store = MemoryStorage::new();
        let sheet = BalanceSheet::new(sha256(b"GOLD"));
        let alice = addr(b"alice");

        sheet.add(&mut store, &alice, 10).unwrap();
        let result = sheet.subtract(&mut store, &alice, 11);
        assert!(matches!(
            result,
            Err(StateError::InsufficientBalance { have: 10, need: 11 })
        ));
        assert_eq!(sheet.get(&store, &alice), 10);
    }

    #[test]
    fn test_add_overflow() {
        let mut store = MemoryStorage::new();
        let sheet = BalanceSheet::new(sha256(b"GOLD"));
        let alice = addr(b"alice");

        sheet.add(&mut store, &alice, u64::MAX).unwrap();
        assert!(matches!(
            sheet.add(&mut store, &alice, 1),
            Err(StateError::BalanceOverflow)
        ));
    }

    #[test]
    fn test_zero_balance_pruned() {
        let mut store = MemoryStorage::new();
        let sheet = BalanceSheet::new(sha256(b"GOLD"));
        let alice = addr(b"alice");

        sheet.add(&mut store, &alice, 50).unwrap();
        sheet.subtract(&mut store, &alice, 50).unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn test_transfer_conserves_total() {
        let mut store = MemoryStorage::new();
        let sheet = BalanceSheet::new(sha256(b"GOLD"));
        let alice = addr(b"alice");
        let bob = addr(b"bob");

        sheet.add(&mut store, &alice, 100).unwrap();
        sheet.transfer(&mut store, &alice, &bob, 30).unwrap();

        assert_eq!(sheet.get(&store, &alice), 70);
        assert_eq!(sheet.get(&store, &bob), 30);
    }

    #[test]
    fn test_tokens_do_not_mix() {
        let mut store = MemoryStorage::new();
        let gold = BalanceSheet::new(sha256(b"GOLD"));
        let iron = BalanceSheet::new(sha256(b"IRON"));
        let alice = addr(b"alice");

        gold.add(&mut store, &alice, 5).unwrap();
        assert_eq!(iron.get(&store, &alice), 0);
    }
}
