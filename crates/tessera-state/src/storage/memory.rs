use std::collections::BTreeMap;

use super::Storage;

/// In-memory storage implementation using BTreeMap
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            data: BTreeMap::new(),
        }
    }

    /// Get the number of stored keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get all stored data (for debugging/testing)
    pub fn all_data(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.data
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.data.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        self.data
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut storage = MemoryStorage::new();

        storage.put(b"key1", b"value1");

        assert_eq!(storage.get(b"key1"), Some(b"value1".to_vec()));
        assert!(storage.contains(b"key1"));
        assert!(!storage.contains(b"key2"));
    }

    #[test]
    fn test_delete() {
        let mut storage = MemoryStorage::new();

        storage.put(b"key1", b"value1");
        storage.delete(b"key1");

        assert_eq!(storage.get(b"key1"), None);
    }

    #[test]
    fn test_overwrite() {
        let mut storage = MemoryStorage::new();

        storage.put(b"key", b"value1");
        storage.put(b"key", b"value2");

        assert_eq!(storage.get(b"key"), Some(b"value2".to_vec()));
    }

    #[test]
    fn test_prefix_query() {
        let mut storage = MemoryStorage::new();

        storage.put(b"users:1", b"alice");
        storage.put(b"users:2", b"bob");
        storage.put(b"items:1", b"item");

        let user_keys = storage.keys_with_prefix(b"users:");
        assert_eq!(user_keys.len(), 2);
        assert!(user_keys.contains(&b"users:1".to_vec()));
        assert!(user_keys.contains(&b"users:2".to_vec()));
    }
}
