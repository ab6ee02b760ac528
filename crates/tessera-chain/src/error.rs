use thiserror::Error;

use tessera_core::Hash;
use tessera_state::StateError;

#[derive(Debug, Error)]
pub enum ChainError {
    // Soft rejections: the block is refused, the chain is untouched, and
    // the caller may offer another block.
    #[error("Block does not link to the current tip")]
    BrokenLinkage,

    #[error("Transaction {0} failed validation")]
    RejectedTransaction(Hash),

    #[error("Transaction {0} failed execution")]
    ExecutionFailed(Hash),

    // Argument errors
    #[error("Invalid chain name: {0:?}")]
    InvalidName(String),

    #[error("Chain already has a child named {0:?}")]
    DuplicateChild(String),

    #[error("Unknown block {0}")]
    UnknownBlock(Hash),

    #[error("Merge segment is empty or ends below the current tip")]
    SegmentTooShort,

    #[error("Merge segment heights are not consecutive")]
    SegmentNotConsecutive,

    #[error("Merge segment disagrees at the root block")]
    IncompatibleChain,

    #[error("Token {0} is not capped")]
    UncappedToken(Hash),

    #[error("No contract bound to this chain")]
    NoContract,

    #[error("Script left no result on the stack")]
    EmptyStack,

    // Invariant violations surfaced from the state layer
    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl ChainError {
    /// Whether this is a soft block rejection rather than a hard failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ChainError::BrokenLinkage
                | ChainError::RejectedTransaction(_)
                | ChainError::ExecutionFailed(_)
        )
    }
}
