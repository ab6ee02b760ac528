use std::fmt;
use std::sync::Arc;

use tessera_core::{sha256, Address, Event, EventSink, Hash};
use tessera_state::{NftRegistry, StagedStore};

/// An immutable batch of transactions with height and hash linkage.
///
/// The engine never constructs blocks; collaborators build them and hand
/// them to `Chain::add_block`. Each block carries the event sink its
/// transactions report into.
#[derive(Clone)]
pub struct Block {
    height: u64,
    hash: Hash,
    previous_hash: Hash,
    transactions: Vec<Arc<dyn Transaction>>,
    notify: Arc<dyn EventSink>,
}

impl Block {
    pub fn new(
        height: u64,
        hash: Hash,
        previous_hash: Hash,
        transactions: Vec<Arc<dyn Transaction>>,
        notify: Arc<dyn EventSink>,
    ) -> Self {
        Block {
            height,
            hash,
            previous_hash,
            transactions,
            notify,
        }
    }

    /// Canonical linkage digest over height, predecessor, and tx hashes
    pub fn digest(height: u64, previous_hash: &Hash, tx_hashes: &[Hash]) -> Hash {
        let mut data = Vec::with_capacity(40 + tx_hashes.len() * 32);
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(previous_hash.as_bytes());
        for tx_hash in tx_hashes {
            data.extend_from_slice(tx_hash.as_bytes());
        }
        sha256(&data)
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn previous_hash(&self) -> Hash {
        self.previous_hash
    }

    pub fn transactions(&self) -> &[Arc<dyn Transaction>] {
        &self.transactions
    }

    pub fn notify(&self) -> &dyn EventSink {
        self.notify.as_ref()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("height", &self.height)
            .field("hash", &self.hash)
            .field("previous_hash", &self.previous_hash)
            .field("transactions", &self.transactions.len())
            .finish()
    }
}

/// Read-only query surface of a chain, handed to transaction validation
pub trait ChainQuery {
    fn name(&self) -> &str;
    fn address(&self) -> Address;
    fn owner(&self) -> Address;
    fn is_root(&self) -> bool;
    fn block_height(&self) -> u64;
    fn last_block(&self) -> Option<&Block>;
    fn find_block_by_hash(&self, hash: &Hash) -> Option<&Block>;
    fn find_block_by_height(&self, height: u64) -> Option<&Block>;
    fn get_token_balance(&self, token: &Hash, address: &Address) -> u64;
}

/// Identity snapshot of a chain plus the shared NFT registry, visible to
/// executing transactions and scripts
#[derive(Clone, Copy)]
pub struct ChainView<'a> {
    pub name: &'a str,
    pub address: Address,
    pub owner: Address,
    pub is_root: bool,
    pub nfts: &'a NftRegistry,
}

/// Everything a transaction touches while executing.
///
/// All KV and ledger mutations go through `store` (a staged view over the
/// chain's storage) so a failed block vanishes without trace and a
/// committed one can be undone during reorg. Events buffer in `events`
/// and reach the block's sink only if the whole block commits.
pub struct TxContext<'a> {
    pub chain: ChainView<'a>,
    pub block: &'a Block,
    pub store: StagedStore<'a>,
    pub events: &'a dyn EventSink,
}

impl TxContext<'_> {
    pub fn emit(&self, event: Event) {
        self.events.notify(&event);
    }
}

/// The opaque transaction executor supplied by collaborators.
///
/// Ordering within a block is significant; the engine calls `is_valid`
/// for every transaction before executing any of them.
pub trait Transaction: Send + Sync {
    /// Stable content hash
    fn hash(&self) -> Hash;

    /// Cheap admission check against current chain state
    fn is_valid(&self, chain: &dyn ChainQuery) -> bool;

    /// Apply the transaction through the context's staged store;
    /// returning `false` rejects the whole block
    fn execute(&self, ctx: &mut TxContext<'_>) -> bool;
}
