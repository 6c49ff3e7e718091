pub mod btree;
pub mod skiplist;

use crate::types::{Key, RecordPos};

/// In-memory map from raw user key to the position of its latest record.
///
/// Keys here are never sequence-encoded. Implementations synchronize
/// internally so readers can call `get` while a commit holds the engine
/// write lock; the engine only mutates under that lock.
pub trait Indexer: Send + Sync {
    /// Insert or replace. Returns the previous position, if any.
    fn put(&self, key: Key, pos: RecordPos) -> Option<RecordPos>;

    fn get(&self, key: &[u8]) -> Option<RecordPos>;

    /// Remove. Returns the removed position, if any.
    fn delete(&self, key: &[u8]) -> Option<RecordPos>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys in ascending order.
    fn keys(&self) -> Vec<Key>;
}

/// Which [`Indexer`] the engine builds at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    #[default]
    BTree,
    SkipList,
}

/// Build an empty index of the given type.
pub fn new_indexer(index_type: IndexType) -> Box<dyn Indexer> {
    match index_type {
        IndexType::BTree => Box::new(btree::BTreeIndex::new()),
        IndexType::SkipList => Box::new(skiplist::SkipListIndex::new()),
    }
}
