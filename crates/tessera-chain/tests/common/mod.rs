//! Shared fixtures for the integration tests: a handful of concrete
//! transaction executors and block/chain constructors.
#![allow(dead_code)]

use std::sync::Arc;

use tessera_chain::{
    ops, Block, Chain, ChainConfig, ChainQuery, SoloNexus, Transaction, TxContext,
};
use tessera_core::{sha256, Address, EventSink, Hash, NullSink, TokenMeta};
use tessera_state::{MemoryStorage, OwnershipSheet, Storage};

pub fn addr(seed: &[u8]) -> Address {
    Address::from_hash(sha256(seed))
}

pub fn root_chain(name: &str) -> Chain<MemoryStorage> {
    Chain::new(
        ChainConfig::new(name, addr(b"owner")),
        MemoryStorage::new(),
        Arc::new(SoloNexus),
    )
    .unwrap()
}

pub fn block_with(height: u64, previous_hash: Hash, txs: Vec<Arc<dyn Transaction>>) -> Block {
    block_with_sink(height, previous_hash, txs, Arc::new(NullSink))
}

pub fn block_with_sink(
    height: u64,
    previous_hash: Hash,
    txs: Vec<Arc<dyn Transaction>>,
    notify: Arc<dyn EventSink>,
) -> Block {
    let tx_hashes: Vec<Hash> = txs.iter().map(|tx| tx.hash()).collect();
    let hash = Block::digest(height, &previous_hash, &tx_hashes);
    Block::new(height, hash, previous_hash, txs, notify)
}

/// Extend a chain with one block holding the given transactions
pub fn extend(chain: &mut Chain<MemoryStorage>, txs: Vec<Arc<dyn Transaction>>) -> Block {
    let (height, previous_hash) = match chain.last_block() {
        Some(tip) => (tip.height() + 1, tip.hash()),
        None => (0, Hash::ZERO),
    };
    let block = block_with(height, previous_hash, txs);
    chain.add_block(block.clone()).unwrap();
    block
}

/// Mint fungible units to an address
pub struct MintTx {
    pub token: Arc<TokenMeta>,
    pub to: Address,
    pub amount: u64,
    pub nonce: u64,
}

impl Transaction for MintTx {
    fn hash(&self) -> Hash {
        let mut data = b"mint:".to_vec();
        data.extend_from_slice(self.token.id().as_bytes());
        data.extend_from_slice(self.to.as_bytes());
        data.extend_from_slice(&self.amount.to_le_bytes());
        data.extend_from_slice(&self.nonce.to_le_bytes());
        sha256(&data)
    }

    fn is_valid(&self, _chain: &dyn ChainQuery) -> bool {
        self.amount > 0
    }

    fn execute(&self, ctx: &mut TxContext<'_>) -> bool {
        ops::mint_token(ctx, self.token.as_ref(), &self.to, self.amount).is_ok()
    }
}

/// Move fungible units between addresses
pub struct TransferTx {
    pub token: Hash,
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub nonce: u64,
}

impl Transaction for TransferTx {
    fn hash(&self) -> Hash {
        let mut data = b"transfer:".to_vec();
        data.extend_from_slice(self.token.as_bytes());
        data.extend_from_slice(self.from.as_bytes());
        data.extend_from_slice(self.to.as_bytes());
        data.extend_from_slice(&self.amount.to_le_bytes());
        data.extend_from_slice(&self.nonce.to_le_bytes());
        sha256(&data)
    }

    fn is_valid(&self, chain: &dyn ChainQuery) -> bool {
        chain.get_token_balance(&self.token, &self.from) >= self.amount
    }

    fn execute(&self, ctx: &mut TxContext<'_>) -> bool {
        ops::transfer_token(ctx, &self.token, &self.from, &self.to, self.amount).is_ok()
    }
}

/// Assign an existing NFT instance to an address
pub struct GiveNftTx {
    pub token: Hash,
    pub to: Address,
    pub id: u64,
}

impl Transaction for GiveNftTx {
    fn hash(&self) -> Hash {
        let mut data = b"give:".to_vec();
        data.extend_from_slice(self.token.as_bytes());
        data.extend_from_slice(self.to.as_bytes());
        data.extend_from_slice(&self.id.to_le_bytes());
        sha256(&data)
    }

    fn is_valid(&self, _chain: &dyn ChainQuery) -> bool {
        true
    }

    fn execute(&self, ctx: &mut TxContext<'_>) -> bool {
        OwnershipSheet::new(self.token)
            .give(&mut ctx.store, &self.to, self.id)
            .is_ok()
    }
}

/// Write an opaque key/value pair through the staged store
pub struct KvPutTx {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Transaction for KvPutTx {
    fn hash(&self) -> Hash {
        let mut data = b"kvput:".to_vec();
        data.extend_from_slice(&self.key);
        data.extend_from_slice(&self.value);
        sha256(&data)
    }

    fn is_valid(&self, _chain: &dyn ChainQuery) -> bool {
        true
    }

    fn execute(&self, ctx: &mut TxContext<'_>) -> bool {
        ctx.store.put(&self.key, &self.value);
        true
    }
}

/// A transaction that fails on demand, either at validation or execution
pub struct FailTx {
    pub at_validation: bool,
    pub nonce: u64,
}

impl Transaction for FailTx {
    fn hash(&self) -> Hash {
        let mut data = b"fail:".to_vec();
        data.push(self.at_validation as u8);
        data.extend_from_slice(&self.nonce.to_le_bytes());
        sha256(&data)
    }

    fn is_valid(&self, _chain: &dyn ChainQuery) -> bool {
        !self.at_validation
    }

    fn execute(&self, _ctx: &mut TxContext<'_>) -> bool {
        false
    }
}
