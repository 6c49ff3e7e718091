use std::cmp::Ordering;

use parking_lot::RwLock;
use rand::Rng;

use crate::index::Indexer;
use crate::types::{Key, RecordPos};

/// Maximum height of the skip list. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// A single node in the skip list.
///
/// Each node has `forward.len()` forward links. Level 0 contains all nodes
/// (a regular linked list). Higher levels skip over nodes, enabling
/// O(log n) average-case search.
///
/// ```text
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
///
/// Links are indices into the arena (`SkipList::nodes`), not pointers.
struct SkipNode<V> {
    key: Vec<u8>,
    value: V,
    forward: Vec<Option<usize>>,
}

/// A probabilistic sorted map from byte keys to `V`.
///
/// Nodes live in an arena; removed slots go on a free list and are reused by
/// the next insert. The head is not a node, just its own row of links.
///
/// Average case: O(log n) insert, lookup and remove, O(n) iteration.
pub struct SkipList<V> {
    head: [Option<usize>; MAX_HEIGHT],
    nodes: Vec<SkipNode<V>>,
    free: Vec<usize>,
    height: usize,
    len: usize,
}

impl<V: Copy> Default for SkipList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy> SkipList<V> {
    pub fn new() -> Self {
        SkipList {
            head: [None; MAX_HEIGHT],
            nodes: Vec::new(),
            free: Vec::new(),
            height: 1,
            len: 0,
        }
    }

    /// Insert a key-value pair. Overwrites and returns the old value if the
    /// key already exists.
    pub fn insert(&mut self, key: Vec<u8>, value: V) -> Option<V> {
        let preds = self.find_predecessors(&key);

        if let Some(next) = self.forward(preds[0], 0) {
            if self.nodes[next].key == key {
                return Some(std::mem::replace(&mut self.nodes[next].value, value));
            }
        }

        // Levels above the current height have no predecessor but the head,
        // which `find_predecessors` already reports as None.
        let height = random_height();
        self.height = self.height.max(height);

        let idx = self.alloc(SkipNode {
            key,
            value,
            forward: vec![None; height],
        });
        for (level, pred) in preds.iter().enumerate().take(height) {
            let next = self.forward(*pred, level);
            self.nodes[idx].forward[level] = next;
            self.set_forward(*pred, level, Some(idx));
        }

        self.len += 1;
        None
    }

    /// Look up a key.
    pub fn get(&self, key: &[u8]) -> Option<V> {
        let mut cur = None;
        for level in (0..self.height).rev() {
            while let Some(next) = self.forward(cur, level) {
                match self.nodes[next].key.as_slice().cmp(key) {
                    Ordering::Less => cur = Some(next),
                    Ordering::Equal => return Some(self.nodes[next].value),
                    Ordering::Greater => break,
                }
            }
        }
        None
    }

    /// Unlink a key at every level it appears on. Returns its value.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let preds = self.find_predecessors(key);
        let target = self.forward(preds[0], 0)?;
        if self.nodes[target].key != key {
            return None;
        }

        for level in 0..self.nodes[target].forward.len() {
            let next = self.nodes[target].forward[level];
            self.set_forward(preds[level], level, next);
        }
        while self.height > 1 && self.head[self.height - 1].is_none() {
            self.height -= 1;
        }

        let value = self.nodes[target].value;
        let node = &mut self.nodes[target];
        node.key = Vec::new();
        node.forward.clear();
        self.free.push(target);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries in sorted key order. Walks level 0.
    pub fn iter(&self) -> SkipListIterator<'_, V> {
        SkipListIterator {
            list: self,
            current: self.head[0],
        }
    }

    /// For each level below the current height, the last node whose key is
    /// strictly less than `key`. `None` means the head.
    fn find_predecessors(&self, key: &[u8]) -> [Option<usize>; MAX_HEIGHT] {
        let mut preds = [None; MAX_HEIGHT];
        let mut cur = None;
        for level in (0..self.height).rev() {
            while let Some(next) = self.forward(cur, level) {
                if self.nodes[next].key.as_slice() < key {
                    cur = Some(next);
                } else {
                    break;
                }
            }
            preds[level] = cur;
        }
        preds
    }

    fn forward(&self, at: Option<usize>, level: usize) -> Option<usize> {
        match at {
            None => self.head[level],
            Some(idx) => self.nodes[idx].forward[level],
        }
    }

    fn set_forward(&mut self, at: Option<usize>, level: usize, to: Option<usize>) {
        match at {
            None => self.head[level] = to,
            Some(idx) => self.nodes[idx].forward[level] = to,
        }
    }

    fn alloc(&mut self, node: SkipNode<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }
}

/// Random level for a new node. Each extra level has probability 1/4,
/// as in LevelDB: fewer levels, less memory than 1/2.
fn random_height() -> usize {
    let mut rng = rand::thread_rng();
    let mut height = 1;
    while height < MAX_HEIGHT && rng.gen_range(0..4) == 0 {
        height += 1;
    }
    height
}

/// Iterator over skip list entries in sorted order.
pub struct SkipListIterator<'a, V> {
    list: &'a SkipList<V>,
    current: Option<usize>,
}

impl<'a, V: Copy> Iterator for SkipListIterator<'a, V> {
    type Item = (&'a [u8], V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = &self.list.nodes[idx];
        self.current = node.forward[0];
        Some((node.key.as_slice(), node.value))
    }
}

/// [`Indexer`] over a [`SkipList`] behind a reader-writer lock.
#[derive(Default)]
pub struct SkipListIndex {
    list: RwLock<SkipList<RecordPos>>,
}

impl SkipListIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indexer for SkipListIndex {
    fn put(&self, key: Key, pos: RecordPos) -> Option<RecordPos> {
        self.list.write().insert(key, pos)
    }

    fn get(&self, key: &[u8]) -> Option<RecordPos> {
        self.list.read().get(key)
    }

    fn delete(&self, key: &[u8]) -> Option<RecordPos> {
        self.list.write().remove(key)
    }

    fn len(&self) -> usize {
        self.list.read().len()
    }

    fn keys(&self) -> Vec<Key> {
        self.list.read().iter().map(|(k, _)| k.to_vec()).collect()
    }
}
