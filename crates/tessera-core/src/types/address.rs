use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Hash;
use crate::error::CoreError;

/// An opaque 32-byte account or chain identifier, derived from a digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The distinguished null address
    pub const NULL: Address = Address([0u8; 32]);

    pub fn from_hash(hash: Hash) -> Self {
        Address(hash.0)
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Some(Address(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes).ok_or(CoreError::InvalidAddress)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn test_null_address() {
        assert!(Address::NULL.is_null());
        assert!(!Address::from_hash(sha256(b"alice")).is_null());
    }

    #[test]
    fn test_from_hash() {
        let hash = sha256(b"account");
        let addr = Address::from_hash(hash);
        assert_eq!(addr.as_bytes(), hash.as_bytes());
    }

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address::from_hash(sha256(b"bob"));
        let recovered = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, recovered);
    }
}
