//! Reserved key prefixes for ledger records in the chain's KV store

pub const BALANCE: &[u8] = b"bal:";
pub const OWNERSHIP: &[u8] = b"own:";
pub const OWNER_INDEX: &[u8] = b"ownr:";
pub const SUPPLY: &[u8] = b"sup:";

/// Build `prefix || token || ':' || suffix`
pub fn scoped(prefix: &[u8], token: &[u8; 32], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + 33 + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(token);
    key.push(b':');
    key.extend_from_slice(suffix);
    key
}
