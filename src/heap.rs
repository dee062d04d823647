//! Heap-backed map: an unbounded slab of node slots.

use std::fmt;

use tracing::debug;

use crate::config::{Comparator, Ownership};
use crate::engine::{Links, NodeLinks, Ptr};
use crate::error::{EraseOutcome, InsertOutcome, MapError, PutOutcome};
use crate::iter::{Cursor, Iter};
use crate::tree::{NodeStore, RawTree, Slot};

/// Growable node slab with a free list of vacated slots.
///
/// `free` always has room for every slot, so vacating never allocates.
pub struct HeapArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<Ptr>,
}

impl<K, V> HeapArena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<K, V> Links for HeapArena<K, V> {
    #[inline]
    fn links(&self, node: Ptr) -> &NodeLinks {
        &self.slots[node.index()].links
    }

    #[inline]
    fn links_mut(&mut self, node: Ptr) -> &mut NodeLinks {
        &mut self.slots[node.index()].links
    }
}

impl<K, V> NodeStore for HeapArena<K, V> {
    type Key = K;
    type Value = V;

    fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [Slot<K, V>] {
        &mut self.slots
    }

    fn claim(&mut self) -> Result<Ptr, MapError> {
        if let Some(&at) = self.free.last() {
            return Ok(at);
        }
        let Some(at) = Ptr::try_new(self.slots.len()) else {
            debug!(limit = Ptr::MAX_SLOTS, "heap slab index space exhausted");
            return Err(MapError::IndexSpaceExhausted {
                limit: Ptr::MAX_SLOTS,
            });
        };
        self.slots.try_reserve(1)?;
        self.free.try_reserve(self.slots.len() + 1)?;
        Ok(at)
    }

    fn occupy(&mut self, at: Ptr, key: K, value: V) {
        let slot = Slot {
            links: NodeLinks::LEAF,
            entry: Some((key, value)),
        };
        if at.index() == self.slots.len() {
            self.slots.push(slot);
        } else {
            debug_assert_eq!(self.free.last(), Some(&at));
            self.free.pop();
            self.slots[at.index()] = slot;
        }
    }

    fn vacate(&mut self, at: Ptr) -> (K, V) {
        let slot = &mut self.slots[at.index()];
        let entry = slot.entry.take().expect("vacated slot must be occupied");
        slot.links = NodeLinks::DETACHED;
        self.free.push(at);
        entry
    }

    fn reset(&mut self) {
        debug_assert!(self.slots.iter().all(|s| !s.is_occupied()));
        self.slots.clear();
        self.free.clear();
    }
}

/// Ordered map with one slab slot per entry and configurable ownership of
/// keys and values.
///
/// With [`Ownership::DeepCopy`], every key and value that enters the map is a
/// fresh duplicate, and every duplicate is released exactly once: on erase, on
/// replacement by `put`, on `clear`, or when the map is dropped.
pub struct HeapMap<K, V> {
    tree: RawTree<HeapArena<K, V>>,
    keys: Ownership<K>,
    values: Ownership<V>,
}

impl<K: Ord, V> HeapMap<K, V> {
    pub fn new() -> Self {
        Self::with_comparator(Ord::cmp)
    }
}

impl<K, V> HeapMap<K, V> {
    pub fn with_comparator(compare: Comparator<K>) -> Self {
        Self::from_parts(compare, Ownership::Borrow, Ownership::Borrow)
    }

    pub(crate) fn from_parts(
        compare: Comparator<K>,
        keys: Ownership<K>,
        values: Ownership<V>,
    ) -> Self {
        Self {
            tree: RawTree::new(HeapArena::new(), compare),
            keys,
            values,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Same as [`len`](Self::len).
    #[inline]
    pub fn size(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Insert `key` unless it is already present. An existing entry is left
    /// untouched and the arguments are dropped.
    pub fn insert(&mut self, key: K, value: V) -> Result<InsertOutcome, MapError> {
        let (keys, values) = (self.keys, self.values);
        self.tree
            .insert_with(key, value, |k, v| (keys.store(k), values.store(v)))
            .inspect_err(|err| debug!(%err, len = self.tree.len(), "heap insert failed"))
    }

    /// Insert, or replace the value stored under `key`.
    pub fn put(&mut self, key: K, value: V) -> Result<PutOutcome, MapError> {
        let node = self.tree.find_node(&key);
        if node.is_null() {
            return self.insert(key, value).map(|_| PutOutcome::Inserted);
        }
        let stored = self.values.store(value);
        let old = std::mem::replace(self.tree.nodes.value_mut(node), stored);
        self.values.release(old);
        Ok(PutOutcome::Replaced)
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        self.tree.find(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        !self.tree.find_node(key).is_null()
    }

    pub fn erase(&mut self, key: &K) -> EraseOutcome {
        match self.tree.erase(key) {
            Some((k, v)) => {
                self.keys.release(k);
                self.values.release(v);
                EraseOutcome::Erased
            }
            None => EraseOutcome::NotFound,
        }
    }

    /// Release every entry. The map stays usable.
    pub fn clear(&mut self) {
        let (keys, values) = (self.keys, self.values);
        let released = self.tree.drain_with(|k, v| {
            keys.release(k);
            values.release(v);
        });
        if released > 0 {
            debug!(released, "heap map cleared");
        }
    }

    /// Release every entry and the map itself. Dropping the map does the same.
    pub fn destroy(self) {
        drop(self);
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.tree.entry_at(self.tree.first())
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.tree.entry_at(self.tree.last())
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.tree)
    }

    /// Cursor at the smallest key, or [`Cursor::END`] when empty.
    pub fn begin(&self) -> Cursor {
        Cursor(self.tree.first())
    }

    pub fn end(&self) -> Cursor {
        Cursor::END
    }

    /// Cursor at the largest key, or [`Cursor::END`] when empty.
    pub fn last_cursor(&self) -> Cursor {
        Cursor(self.tree.last())
    }

    pub fn next(&self, cursor: Cursor) -> Cursor {
        Cursor(self.tree.next(cursor.0))
    }

    pub fn prev(&self, cursor: Cursor) -> Cursor {
        Cursor(self.tree.prev(cursor.0))
    }

    pub fn key(&self, cursor: Cursor) -> Option<&K> {
        self.tree.entry_at(cursor.0).map(|(k, _)| k)
    }

    pub fn value(&self, cursor: Cursor) -> Option<&V> {
        self.tree.entry_at(cursor.0).map(|(_, v)| v)
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> &RawTree<HeapArena<K, V>> {
        &self.tree
    }
}

impl<K: Ord, V> Default for HeapMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for HeapMap<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<'a, K, V> IntoIterator for &'a HeapMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for HeapMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
