use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_core::{Hash, Token};
use tracing::debug;

type PayloadMap = BTreeMap<Hash, BTreeMap<u64, Vec<u8>>>;

/// Per-chain registry of NFT payloads, keyed by token and instance id.
///
/// A single mutex guards the whole registry: creation, destruction, and
/// reads may arrive from arbitrary execution paths while the rest of the
/// chain state is behind the caller's exclusive borrow. Instance ids come
/// from the token and are never reused.
#[derive(Debug, Default)]
pub struct NftRegistry {
    inner: Mutex<PayloadMap>,
}

impl NftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, PayloadMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a payload under a fresh instance id and return the id
    pub fn create(&self, token: &dyn Token, data: Vec<u8>) -> u64 {
        let mut map = self.locked();
        let id = token.generate_id();
        map.entry(token.id()).or_default().insert(id, data);
        debug!(token = %token.id(), id, "nft payload created");
        id
    }

    /// Remove a payload; reports whether anything was removed
    pub fn destroy(&self, token: &Hash, id: u64) -> bool {
        let mut map = self.locked();
        let removed = map
            .get_mut(token)
            .map(|payloads| payloads.remove(&id).is_some())
            .unwrap_or(false);
        if removed {
            debug!(%token, id, "nft payload destroyed");
        }
        removed
    }

    /// Fetch a payload copy, if present
    pub fn get(&self, token: &Hash, id: u64) -> Option<Vec<u8>> {
        self.locked()
            .get(token)
            .and_then(|payloads| payloads.get(&id))
            .cloned()
    }

    /// Number of payloads registered for a token
    pub fn count(&self, token: &Hash) -> usize {
        self.locked().get(token).map_or(0, |payloads| payloads.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::TokenMeta;

    #[test]
    fn test_create_returns_fresh_ids() {
        let registry = NftRegistry::new();
        let token = TokenMeta::non_fungible("CROWN");

        let id1 = registry.create(&token, b"x".to_vec());
        let id2 = registry.create(&token, b"y".to_vec());

        assert_ne!(id1, id2);
        assert_eq!(registry.get(&token.id(), id1), Some(b"x".to_vec()));
        assert_eq!(registry.get(&token.id(), id2), Some(b"y".to_vec()));
        assert_eq!(registry.count(&token.id()), 2);
    }

    #[test]
    fn test_destroy_is_single_shot() {
        let registry = NftRegistry::new();
        let token = TokenMeta::non_fungible("CROWN");

        let id = registry.create(&token, b"x".to_vec());

        assert!(registry.destroy(&token.id(), id));
        assert!(!registry.destroy(&token.id(), id));
        assert_eq!(registry.get(&token.id(), id), None);
    }

    #[test]
    fn test_unknown_token_reads_absent() {
        let registry = NftRegistry::new();
        let token = TokenMeta::non_fungible("CROWN");

        assert_eq!(registry.get(&token.id(), 1), None);
        assert!(!registry.destroy(&token.id(), 1));
        assert_eq!(registry.count(&token.id()), 0);
    }
}
