use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },

    #[error("Balance overflow")]
    BalanceOverflow,

    #[error("Token instance {0} already has an owner")]
    NftAlreadyOwned(u64),

    #[error("Token instance {0} is not owned by that address")]
    NftNotOwned(u64),

    #[error("Supply exhausted: requested {requested}, available {available}")]
    SupplyExhausted { requested: u64, available: u64 },

    #[error("Burn of {requested} exceeds circulating supply {circulating}")]
    SupplyUnderflow { requested: u64, circulating: u64 },

    #[error("Supply cap {max} exceeded")]
    SupplyCapExceeded { max: u64 },

    #[error("Supply sheet already initialized")]
    SupplyExists,

    #[error("No supply sheet for that token")]
    SupplyMissing,

    #[error("Supply sheet invariant violated")]
    SupplyInvariant,

    #[error("Change-set already undone")]
    ChangeSetSpent,

    #[error("Change-set was never applied")]
    ChangeSetNotApplied,

    #[error("Core error: {0}")]
    Core(#[from] tessera_core::CoreError),
}
