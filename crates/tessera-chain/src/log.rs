use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tessera_core::Hash;
use tessera_state::ChangeSet;

use crate::block::{Block, Transaction};

/// The ordered chain of accepted blocks plus its lookup indexes.
///
/// Blocks are indexed by height and by hash, transactions by hash to
/// their containing block, and every accepted block keeps the change-set
/// that committed it so the block can be undone during reorg.
#[derive(Debug, Default)]
pub struct BlockLog {
    by_height: BTreeMap<u64, Block>,
    height_by_hash: HashMap<Hash, u64>,
    block_by_tx: HashMap<Hash, Hash>,
    changesets: HashMap<Hash, ChangeSet>,
}

impl BlockLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted blocks
    pub fn len(&self) -> u64 {
        self.by_height.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.by_height.is_empty()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.by_height.last_key_value().map(|(_, block)| block)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.height_by_hash.contains_key(hash)
    }

    pub fn get_by_hash(&self, hash: &Hash) -> Option<&Block> {
        self.height_by_hash
            .get(hash)
            .and_then(|height| self.by_height.get(height))
    }

    pub fn get_by_height(&self, height: u64) -> Option<&Block> {
        self.by_height.get(&height)
    }

    /// The block containing a transaction, by transaction hash
    pub fn block_of_transaction(&self, tx_hash: &Hash) -> Option<&Block> {
        self.block_by_tx
            .get(tx_hash)
            .and_then(|block_hash| self.get_by_hash(block_hash))
    }

    pub fn transaction(&self, tx_hash: &Hash) -> Option<Arc<dyn Transaction>> {
        self.block_of_transaction(tx_hash)?
            .transactions()
            .iter()
            .find(|tx| tx.hash() == *tx_hash)
            .cloned()
    }

    pub fn transaction_count(&self) -> u64 {
        self.by_height
            .values()
            .map(|block| block.transactions().len() as u64)
            .sum()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.by_height.values()
    }

    /// Record an accepted block together with its committed change-set.
    /// Linkage is the caller's responsibility.
    pub fn insert(&mut self, block: Block, changes: ChangeSet) {
        self.height_by_hash.insert(block.hash(), block.height());
        for tx in block.transactions() {
            self.block_by_tx.insert(tx.hash(), block.hash());
        }
        self.changesets.insert(block.hash(), changes);
        self.by_height.insert(block.height(), block);
    }

    /// Pop the tip block and its change-set, dropping all of its indexes
    pub fn remove_tip(&mut self) -> Option<(Block, ChangeSet)> {
        let (&height, _) = self.by_height.last_key_value()?;
        let block = self.by_height.remove(&height)?;
        self.height_by_hash.remove(&block.hash());
        for tx in block.transactions() {
            self.block_by_tx.remove(&tx.hash());
        }
        let changes = self.changesets.remove(&block.hash()).unwrap_or_default();
        Some((block, changes))
    }
}
