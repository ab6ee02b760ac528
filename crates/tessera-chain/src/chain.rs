use std::collections::BTreeMap;
use std::sync::Arc;

use tessera_core::{sha256, serialize, Address, BufferSink, EventSink, Hash, Token, Value};
use tessera_state::{
    keys, BalanceSheet, ChangeSet, NftRegistry, OwnershipSheet, StagedStore, StateError, Storage,
    Supply, SupplySheet,
};
use tracing::{debug, info, warn};

use crate::block::{Block, ChainQuery, ChainView, Transaction, TxContext};
use crate::error::ChainError;
use crate::log::BlockLog;
use crate::nexus::Nexus;
use crate::runtime::ScriptEngine;

/// Check a chain name: 3 to 19 characters over `[a-z0-9_]`
pub fn validate_name(name: &str) -> bool {
    if name.len() < 3 || name.len() >= 20 {
        return false;
    }
    name.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Immutable identity of a chain at construction time
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub name: String,
    pub owner: Address,
    /// Address of the contract bound to this chain, if any
    pub contract: Option<Address>,
}

impl ChainConfig {
    pub fn new(name: &str, owner: Address) -> Self {
        ChainConfig {
            name: name.to_string(),
            owner,
            contract: None,
        }
    }

    pub fn with_contract(mut self, contract: Address) -> Self {
        self.contract = Some(contract);
        self
    }
}

/// One chain: an append-only block log over a versioned KV store, with
/// token ledgers, an NFT registry, and zero or more child chains.
///
/// Mutations take `&mut self` and queries `&self`, which gives the
/// single-writer/multi-reader discipline statically; embedders that share
/// a chain across threads wrap it in their own lock.
pub struct Chain<S: Storage> {
    name: String,
    address: Address,
    owner: Address,
    parent_address: Option<Address>,
    parent_block: Option<Hash>,
    contract: Option<Address>,
    engine: Option<Arc<dyn ScriptEngine>>,
    storage: S,
    log: BlockLog,
    nfts: NftRegistry,
    children: BTreeMap<String, Chain<S>>,
    nexus: Arc<dyn Nexus>,
}

impl<S: Storage> Chain<S> {
    /// Create a root chain
    pub fn new(config: ChainConfig, storage: S, nexus: Arc<dyn Nexus>) -> Result<Self, ChainError> {
        Self::with_parent(config, storage, nexus, None)
    }

    fn with_parent(
        config: ChainConfig,
        storage: S,
        nexus: Arc<dyn Nexus>,
        parent: Option<(Address, Hash)>,
    ) -> Result<Self, ChainError> {
        if !validate_name(&config.name) {
            return Err(ChainError::InvalidName(config.name));
        }
        let address = Address::from_hash(sha256(config.name.to_lowercase().as_bytes()));
        info!(name = %config.name, %address, root = parent.is_none(), "chain created");

        Ok(Chain {
            name: config.name,
            address,
            owner: config.owner,
            parent_address: parent.map(|(addr, _)| addr),
            parent_block: parent.map(|(_, block)| block),
            contract: config.contract,
            engine: None,
            storage,
            log: BlockLog::new(),
            nfts: NftRegistry::new(),
            children: BTreeMap::new(),
            nexus,
        })
    }

    /// Bind the script engine used by `invoke_contract`
    pub fn bind_engine(&mut self, engine: Arc<dyn ScriptEngine>) {
        self.engine = Some(engine);
    }

    // Identity

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn parent_address(&self) -> Option<Address> {
        self.parent_address
    }

    pub fn parent_block(&self) -> Option<Hash> {
        self.parent_block
    }

    pub fn is_root(&self) -> bool {
        self.parent_address.is_none()
    }

    /// Address of the root of this chain's tree, resolved through the
    /// nexus parent-lookup
    pub fn get_root(&self) -> Address {
        let mut root = self.address;
        let mut parent = self.parent_address;
        while let Some(addr) = parent {
            root = addr;
            parent = self.nexus.parent_of(&addr);
        }
        root
    }

    // Chain tree

    /// Create and register a child chain anchored at one of this chain's
    /// blocks. Supply sheets present on this chain are borrowed into the
    /// child at this moment: the child's resident ceiling becomes the
    /// parent's current resident amount.
    pub fn create_child(
        &mut self,
        config: ChainConfig,
        storage: S,
        parent_block: &Hash,
    ) -> Result<&mut Chain<S>, ChainError> {
        if self.children.contains_key(&config.name) {
            return Err(ChainError::DuplicateChild(config.name));
        }
        if !self.log.contains(parent_block) {
            return Err(ChainError::UnknownBlock(*parent_block));
        }

        let name = config.name.clone();
        let mut child = Chain::with_parent(
            config,
            storage,
            Arc::clone(&self.nexus),
            Some((self.address, *parent_block)),
        )?;

        for key in self.storage.keys_with_prefix(keys::SUPPLY) {
            if let Some(bytes) = self.storage.get(&key) {
                let parent_supply: Supply =
                    serialize::from_bytes(&bytes).map_err(StateError::from)?;
                let borrowed = Supply::borrowed(&parent_supply);
                child
                    .storage
                    .put(&key, &serialize::to_bytes(&borrowed).map_err(StateError::from)?);
                debug!(child = %child.name, local = borrowed.local, "supply sheet borrowed");
            }
        }

        Ok(self.children.entry(name).or_insert(child))
    }

    /// Depth-first search of the subtree for a chain with this address
    pub fn find_child_chain(&self, address: &Address) -> Option<&Chain<S>> {
        if address.is_null() {
            return None;
        }
        for child in self.children.values() {
            if child.address == *address {
                return Some(child);
            }
            if let Some(found) = child.find_child_chain(address) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_child_chain_mut(&mut self, address: &Address) -> Option<&mut Chain<S>> {
        if address.is_null() {
            return None;
        }
        for child in self.children.values_mut() {
            if child.address == *address {
                return Some(child);
            }
            if let Some(found) = child.find_child_chain_mut(address) {
                return Some(found);
            }
        }
        None
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    // Block log queries

    /// Number of accepted blocks
    pub fn block_height(&self) -> u64 {
        self.log.len()
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.log.tip()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.log.blocks()
    }

    pub fn transaction_count(&self) -> u64 {
        self.log.transaction_count()
    }

    pub fn find_block_by_hash(&self, hash: &Hash) -> Option<&Block> {
        self.log.get_by_hash(hash)
    }

    pub fn find_block_by_height(&self, height: u64) -> Option<&Block> {
        self.log.get_by_height(height)
    }

    pub fn find_transaction_by_hash(&self, tx_hash: &Hash) -> Option<Arc<dyn Transaction>> {
        self.log.transaction(tx_hash)
    }

    pub fn find_transaction_block(&self, tx_hash: &Hash) -> Option<&Block> {
        self.log.block_of_transaction(tx_hash)
    }

    // Ledger queries

    pub fn get_token_balance(&self, token: &Hash, address: &Address) -> u64 {
        BalanceSheet::new(*token).get(&self.storage, address)
    }

    pub fn get_owned_tokens(
        &self,
        token: &Hash,
        address: &Address,
    ) -> Result<std::collections::BTreeSet<u64>, ChainError> {
        Ok(OwnershipSheet::new(*token).get(&self.storage, address)?)
    }

    pub fn get_token_owner(&self, token: &Hash, id: u64) -> Result<Option<Address>, ChainError> {
        Ok(OwnershipSheet::new(*token).owner_of(&self.storage, id)?)
    }

    pub fn get_token_supply(&self, token: &Hash) -> Result<Option<Supply>, ChainError> {
        Ok(SupplySheet::new(*token).load(&self.storage)?)
    }

    pub fn get_nft(&self, token: &Hash, id: u64) -> Option<Vec<u8>> {
        self.nfts.get(token, id)
    }

    /// Read-only access to the chain's backing store
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // Mutations

    /// Create the supply sheet for a capped token on this chain.
    /// Root chains start with nothing resident; minting raises residency
    /// up to the cap.
    pub fn init_supply_sheet(&mut self, token: &dyn Token) -> Result<(), ChainError> {
        if !token.is_capped() {
            return Err(ChainError::UncappedToken(token.id()));
        }
        SupplySheet::new(token.id())
            .init(&mut self.storage, Supply::root(token.max_supply()))?;
        Ok(())
    }

    /// Register an NFT payload under a fresh instance id
    pub fn create_nft(&mut self, token: &dyn Token, data: Vec<u8>) -> u64 {
        self.nfts.create(token, data)
    }

    /// Drop an NFT payload; reports whether anything was removed
    pub fn destroy_nft(&mut self, token: &Hash, id: u64) -> bool {
        self.nfts.destroy(token, id)
    }

    /// Validate, execute, and commit a block at the tip.
    ///
    /// All-or-nothing: any linkage, validation, or execution failure
    /// leaves the chain untouched. On success the block's change-set is
    /// committed and retained for reorg, the indexes advance, buffered
    /// events reach the block's sink, and the nexus plugin hook fires.
    pub fn add_block(&mut self, block: Block) -> Result<(), ChainError> {
        match self.log.tip() {
            Some(tip) => {
                if block.height() != tip.height() + 1 || block.previous_hash() != tip.hash() {
                    warn!(
                        height = block.height(),
                        hash = %block.hash(),
                        "block does not extend the tip"
                    );
                    return Err(ChainError::BrokenLinkage);
                }
            }
            None => {
                if block.height() != 0 {
                    return Err(ChainError::BrokenLinkage);
                }
            }
        }

        for tx in block.transactions() {
            if !tx.is_valid(&*self) {
                debug!(tx = %tx.hash(), "transaction failed validation");
                return Err(ChainError::RejectedTransaction(tx.hash()));
            }
        }

        let mut changes = ChangeSet::new();
        let buffered = BufferSink::new();
        {
            let mut ctx = TxContext {
                chain: ChainView {
                    name: &self.name,
                    address: self.address,
                    owner: self.owner,
                    is_root: self.parent_address.is_none(),
                    nfts: &self.nfts,
                },
                block: &block,
                store: StagedStore::new(&self.storage, &mut changes),
                events: &buffered,
            };
            for tx in block.transactions() {
                if !tx.execute(&mut ctx) {
                    debug!(tx = %tx.hash(), "transaction failed execution");
                    return Err(ChainError::ExecutionFailed(tx.hash()));
                }
            }
        }

        changes.apply(&mut self.storage)?;
        for event in buffered.drain() {
            block.notify().notify(&event);
        }

        info!(
            height = block.height(),
            hash = %block.hash(),
            txs = block.transactions().len(),
            "block accepted"
        );
        self.log.insert(block.clone(), changes);
        self.nexus.plugin_trigger_block(&self.address, &block);
        Ok(())
    }

    /// Rewind the chain until `target` is the tip, undoing each removed
    /// block's change-set in reverse commit order. A target that already
    /// is the tip is a no-op; an unknown target is an error.
    pub fn delete_blocks(&mut self, target: &Hash) -> Result<(), ChainError> {
        if !self.log.contains(target) {
            return Err(ChainError::UnknownBlock(*target));
        }

        loop {
            match self.log.tip() {
                Some(tip) if tip.hash() == *target => break,
                Some(_) => {}
                None => break,
            }
            let Some((block, mut changes)) = self.log.remove_tip() else {
                break;
            };
            changes.undo(&mut self.storage)?;
            debug!(height = block.height(), hash = %block.hash(), "block undone");
        }

        info!(tip = %target, height = self.log.len(), "chain rewound");
        Ok(())
    }

    /// Converge onto a sibling's block sequence.
    ///
    /// The segment must have consecutive heights and reach at least the
    /// current tip. Entries the chain already holds are skipped; at the
    /// first divergence the chain rewinds to the last common block and
    /// re-executes the remote blocks through `add_block`.
    pub fn merge_blocks(&mut self, blocks: Vec<Block>) -> Result<(), ChainError> {
        let first_height = match blocks.first() {
            Some(block) => block.height(),
            None => return Err(ChainError::SegmentTooShort),
        };
        for (offset, block) in blocks.iter().enumerate() {
            if block.height() != first_height + offset as u64 {
                return Err(ChainError::SegmentNotConsecutive);
            }
        }

        let last_height = first_height + blocks.len() as u64 - 1;
        if let Some(tip) = self.log.tip() {
            if last_height < tip.height() {
                return Err(ChainError::SegmentTooShort);
            }
        }

        for block in blocks {
            let local_hash = self.log.get_by_height(block.height()).map(|b| b.hash());
            match local_hash {
                Some(hash) if hash == block.hash() => continue,
                Some(_) => {
                    if block.height() == 0 {
                        return Err(ChainError::IncompatibleChain);
                    }
                    let anchor = self
                        .log
                        .get_by_height(block.height() - 1)
                        .map(|b| b.hash())
                        .ok_or(ChainError::UnknownBlock(block.previous_hash()))?;
                    info!(fork_height = block.height(), "divergence, rewinding");
                    self.delete_blocks(&anchor)?;
                    self.add_block(block)?;
                }
                None => self.add_block(block)?,
            }
        }
        Ok(())
    }

    /// Call a method on the chain's bound contract, read-only.
    ///
    /// The script runs against a throwaway change-set that is never
    /// applied; only the popped top-of-stack value survives.
    pub fn invoke_contract(&self, method: &str, args: &[Value]) -> Result<Value, ChainError> {
        let contract = self.contract.ok_or(ChainError::NoContract)?;
        let engine = self.engine.as_ref().ok_or(ChainError::NoContract)?;

        let script = engine.build_call(&contract, method, args)?;
        let mut changes = ChangeSet::new();
        let view = ChainView {
            name: &self.name,
            address: self.address,
            owner: self.owner,
            is_root: self.parent_address.is_none(),
            nfts: &self.nfts,
        };
        let mut staged = StagedStore::new(&self.storage, &mut changes);
        let mut stack = engine.execute(&script, &view, &mut staged)?;

        stack.pop().ok_or(ChainError::EmptyStack)
    }
}

impl<S: Storage> ChainQuery for Chain<S> {
    fn name(&self) -> &str {
        Chain::name(self)
    }

    fn address(&self) -> Address {
        Chain::address(self)
    }

    fn owner(&self) -> Address {
        Chain::owner(self)
    }

    fn is_root(&self) -> bool {
        Chain::is_root(self)
    }

    fn block_height(&self) -> u64 {
        Chain::block_height(self)
    }

    fn last_block(&self) -> Option<&Block> {
        Chain::last_block(self)
    }

    fn find_block_by_hash(&self, hash: &Hash) -> Option<&Block> {
        Chain::find_block_by_hash(self, hash)
    }

    fn find_block_by_height(&self, height: u64) -> Option<&Block> {
        Chain::find_block_by_height(self, height)
    }

    fn get_token_balance(&self, token: &Hash, address: &Address) -> u64 {
        Chain::get_token_balance(self, token, address)
    }
}
