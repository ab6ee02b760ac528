use std::collections::HashMap;

use tracing::debug;

use crate::error::StateError;
use crate::storage::Storage;

/// One touched key: the value before this change-set and the value after.
///
/// `prior` is captured on first touch and never revised; `next` tracks the
/// latest staged write (`None` means the key is deleted).
#[derive(Debug, Clone)]
struct ChangeEntry {
    key: Vec<u8>,
    prior: Option<Vec<u8>>,
    next: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeSetState {
    Staged,
    Applied,
    Undone,
}

/// A staged, reversible batch of key/value mutations.
///
/// Writes buffer here until `apply` flushes them to a backing store;
/// `undo` restores the recorded prior values in reverse order. Applying
/// and then undoing leaves the store byte-identical.
#[derive(Debug)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
    index: HashMap<Vec<u8>, usize>,
    state: ChangeSetState,
}

impl ChangeSet {
    pub fn new() -> Self {
        ChangeSet {
            entries: Vec::new(),
            index: HashMap::new(),
            state: ChangeSetState::Staged,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_applied(&self) -> bool {
        self.state == ChangeSetState::Applied
    }

    /// Staged view of a key: `None` if untouched, otherwise the pending
    /// value (`Some(None)` marks a staged delete).
    fn pending(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].next.as_deref())
    }

    fn stage(&mut self, key: &[u8], prior: Option<Vec<u8>>, next: Option<Vec<u8>>) {
        match self.index.get(key) {
            Some(&slot) => {
                self.entries[slot].next = next;
            }
            None => {
                self.index.insert(key.to_vec(), self.entries.len());
                self.entries.push(ChangeEntry {
                    key: key.to_vec(),
                    prior,
                    next,
                });
            }
        }
    }

    /// Flush staged mutations to the backing store in insertion order.
    ///
    /// A second `apply` on an applied set is a no-op; applying after
    /// `undo` is an invariant violation.
    pub fn apply(&mut self, store: &mut dyn Storage) -> Result<(), StateError> {
        match self.state {
            ChangeSetState::Applied => return Ok(()),
            ChangeSetState::Undone => return Err(StateError::ChangeSetSpent),
            ChangeSetState::Staged => {}
        }

        for entry in &self.entries {
            match &entry.next {
                Some(value) => store.put(&entry.key, value),
                None => store.delete(&entry.key),
            }
        }

        self.state = ChangeSetState::Applied;
        debug!(entries = self.entries.len(), "change-set applied");
        Ok(())
    }

    /// Restore the recorded prior values in reverse insertion order.
    ///
    /// Only valid once, on an applied set; the set is spent afterwards.
    pub fn undo(&mut self, store: &mut dyn Storage) -> Result<(), StateError> {
        match self.state {
            ChangeSetState::Staged => return Err(StateError::ChangeSetNotApplied),
            ChangeSetState::Undone => return Err(StateError::ChangeSetSpent),
            ChangeSetState::Applied => {}
        }

        for entry in self.entries.iter().rev() {
            match &entry.prior {
                Some(value) => store.put(&entry.key, value),
                None => store.delete(&entry.key),
            }
        }

        self.state = ChangeSetState::Undone;
        debug!(entries = self.entries.len(), "change-set undone");
        Ok(())
    }
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::new()
    }
}

/// A change-set bound to a backing store, presented as a `Storage`.
///
/// Reads see staged values first and fall through to the store; writes
/// and deletes buffer into the change-set, recording the store's value on
/// first touch. Handing one of these to transaction execution makes every
/// mutation reversible.
pub struct StagedStore<'a> {
    base: &'a dyn Storage,
    changes: &'a mut ChangeSet,
}

impl<'a> StagedStore<'a> {
    pub fn new(base: &'a dyn Storage, changes: &'a mut ChangeSet) -> Self {
        StagedStore { base, changes }
    }
}

impl Storage for StagedStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.changes.pending(key) {
            Some(pending) => pending.map(|v| v.to_vec()),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        let prior = match self.changes.pending(key) {
            Some(_) => None, // prior already recorded on first touch
            None => self.base.get(key),
        };
        self.changes.stage(key, prior, Some(value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        let prior = match self.changes.pending(key) {
            Some(_) => None,
            None => self.base.get(key),
        };
        self.changes.stage(key, prior, None);
    }

    fn contains(&self, key: &[u8]) -> bool {
        match self.changes.pending(key) {
            Some(pending) => pending.is_some(),
            None => self.base.contains(key),
        }
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();

        for key in self.base.keys_with_prefix(prefix) {
            match self.changes.pending(&key) {
                Some(None) => {} // staged delete
                _ => keys.push(key),
            }
        }

        for entry in &self.changes.entries {
            if entry.key.starts_with(prefix)
                && entry.next.is_some()
                && !self.base.contains(&entry.key)
            {
                keys.push(entry.key.clone());
            }
        }

        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_reads_see_staged_values() {
        let mut store = MemoryStorage::new();
        store.put(b"a", b"1");

        let mut changes = ChangeSet::new();
        let mut staged = StagedStore::new(&store, &mut changes);

        assert_eq!(staged.get(b"a"), Some(b"1".to_vec()));

        staged.put(b"a", b"2");
        staged.put(b"b", b"3");
        assert_eq!(staged.get(b"a"), Some(b"2".to_vec()));
        assert_eq!(staged.get(b"b"), Some(b"3".to_vec()));

        // nothing hit the backing store yet
        assert_eq!(store.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b"), None);
    }

    #[test]
    fn test_apply_flushes_in_order() {
        let mut store = MemoryStorage::new();
        store.put(b"a", b"1");

        let mut changes = ChangeSet::new();
        let mut staged = StagedStore::new(&store, &mut changes);
        staged.put(b"a", b"2");
        staged.delete(b"a");
        staged.put(b"b", b"3");

        changes.apply(&mut store).unwrap();
        assert_eq!(store.get(b"a"), None);
        assert_eq!(store.get(b"b"), Some(b"3".to_vec()));

        // idempotent once applied
        changes.apply(&mut store).unwrap();
        assert_eq!(store.get(b"b"), Some(b"3".to_vec()));
    }

    #[test]
    fn test_apply_then_undo_is_noop() {
        let mut store = MemoryStorage::new();
        store.put(b"a", b"1");
        store.put(b"b", b"2");
        let before = store.all_data().clone();

        let mut changes = ChangeSet::new();
        let mut staged = StagedStore::new(&store, &mut changes);
        staged.put(b"a", b"changed");
        staged.delete(b"b");
        staged.put(b"c", b"new");

        changes.apply(&mut store).unwrap();
        assert_ne!(store.all_data(), &before);

        changes.undo(&mut store).unwrap();
        assert_eq!(store.all_data(), &before);
    }

    #[test]
    fn test_prior_recorded_on_first_touch_only() {
        let mut store = MemoryStorage::new();
        store.put(b"a", b"original");

        let mut changes = ChangeSet::new();
        let mut staged = StagedStore::new(&store, &mut changes);
        staged.put(b"a", b"first");
        staged.put(b"a", b"second");

        assert_eq!(changes.len(), 1);
        changes.apply(&mut store).unwrap();
        assert_eq!(store.get(b"a"), Some(b"second".to_vec()));

        changes.undo(&mut store).unwrap();
        assert_eq!(store.get(b"a"), Some(b"original".to_vec()));
    }

    #[test]
    fn test_undo_before_apply_fails() {
        let mut store = MemoryStorage::new();
        let mut changes = ChangeSet::new();

        let mut staged = StagedStore::new(&store, &mut changes);
        staged.put(b"a", b"1");

        assert!(matches!(
            changes.undo(&mut store),
            Err(StateError::ChangeSetNotApplied)
        ));
    }

    #[test]
    fn test_spent_changeset_rejected() {
        let mut store = MemoryStorage::new();
        let mut changes = ChangeSet::new();
        let mut staged = StagedStore::new(&store, &mut changes);
        staged.put(b"a", b"1");

        changes.apply(&mut store).unwrap();
        changes.undo(&mut store).unwrap();

        assert!(matches!(
            changes.apply(&mut store),
            Err(StateError::ChangeSetSpent)
        ));
        assert!(matches!(
            changes.undo(&mut store),
            Err(StateError::ChangeSetSpent)
        ));
    }

    #[test]
    fn test_staged_prefix_query() {
        let mut store = MemoryStorage::new();
        store.put(b"p:1", b"a");
        store.put(b"p:2", b"b");

        let mut changes = ChangeSet::new();
        let mut staged = StagedStore::new(&store, &mut changes);
        staged.delete(b"p:1");
        staged.put(b"p:3", b"c");

        let keys = staged.keys_with_prefix(b"p:");
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&b"p:2".to_vec()));
        assert!(keys.contains(&b"p:3".to_vec()));
    }
}
