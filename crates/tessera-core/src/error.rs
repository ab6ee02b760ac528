use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid digest length")]
    InvalidHashLength,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
