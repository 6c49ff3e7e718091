use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::index::Indexer;
use crate::types::{Key, RecordPos};

/// Ordered index on `std`'s B-tree.
#[derive(Default)]
pub struct BTreeIndex {
    tree: RwLock<BTreeMap<Key, RecordPos>>,
}

impl BTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indexer for BTreeIndex {
    fn put(&self, key: Key, pos: RecordPos) -> Option<RecordPos> {
        self.tree.write().insert(key, pos)
    }

    fn get(&self, key: &[u8]) -> Option<RecordPos> {
        self.tree.read().get(key).copied()
    }

    fn delete(&self, key: &[u8]) -> Option<RecordPos> {
        self.tree.write().remove(key)
    }

    fn len(&self) -> usize {
        self.tree.read().len()
    }

    fn keys(&self) -> Vec<Key> {
        self.tree.read().keys().cloned().collect()
    }
}
