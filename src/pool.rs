//! Fixed-capacity map: `N` node slots reserved inline, no allocation.

use std::fmt;

use tracing::debug;

use crate::config::Comparator;
use crate::engine::{Links, NodeLinks, Ptr};
use crate::error::{EraseOutcome, InsertOutcome, MapError, PutOutcome};
use crate::iter::{Cursor, Iter};
use crate::tree::{NodeStore, RawTree, Slot};

/// `N` slots, each either in use or free. Allocation scans for the first free
/// slot; capacity is small by assumption.
#[derive(Clone)]
pub struct FixedPool<K, V, const N: usize> {
    slots: [Slot<K, V>; N],
}

impl<K, V, const N: usize> FixedPool<K, V, N> {
    fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::vacant()),
        }
    }

    fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }
}

impl<K, V, const N: usize> Links for FixedPool<K, V, N> {
    #[inline]
    fn links(&self, node: Ptr) -> &NodeLinks {
        &self.slots[node.index()].links
    }

    #[inline]
    fn links_mut(&mut self, node: Ptr) -> &mut NodeLinks {
        &mut self.slots[node.index()].links
    }
}

impl<K, V, const N: usize> NodeStore for FixedPool<K, V, N> {
    type Key = K;
    type Value = V;

    fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut [Slot<K, V>] {
        &mut self.slots
    }

    fn claim(&mut self) -> Result<Ptr, MapError> {
        match self.slots.iter().position(|s| !s.is_occupied()) {
            Some(index) => Ok(Ptr::new(index)),
            None => {
                debug!(capacity = N, "fixed pool exhausted");
                Err(MapError::PoolExhausted { capacity: N })
            }
        }
    }

    fn occupy(&mut self, at: Ptr, key: K, value: V) {
        let slot = &mut self.slots[at.index()];
        debug_assert!(!slot.is_occupied());
        slot.links = NodeLinks::LEAF;
        slot.entry = Some((key, value));
    }

    fn vacate(&mut self, at: Ptr) -> (K, V) {
        let slot = &mut self.slots[at.index()];
        slot.links = NodeLinks::DETACHED;
        slot.entry.take().expect("vacated slot must be occupied")
    }

    fn reset(&mut self) {
        debug_assert_eq!(self.in_use(), 0);
    }
}

/// Ordered map of plain `Copy` keys and values in a pool of `N` slots.
///
/// Values are stored by assignment; there is no ownership policy. Once all
/// `N` slots are taken, inserting a new key fails with
/// [`MapError::PoolExhausted`] and the map is left unchanged.
///
/// ```rust
/// use avl_rs::{FixedMap, InsertOutcome, MapError};
///
/// let mut map: FixedMap<u32, fn() -> &'static str, 2> = FixedMap::new();
/// assert_eq!(map.insert(10, || "hello"), Ok(InsertOutcome::Inserted));
/// assert_eq!(map.insert(20, || "goodbye"), Ok(InsertOutcome::Inserted));
/// assert_eq!(map.insert(30, || "full"), Err(MapError::PoolExhausted { capacity: 2 }));
/// assert_eq!(map.find(&10).map(|f| f()), Some("hello"));
/// ```
#[derive(Clone)]
pub struct FixedMap<K, V, const N: usize> {
    tree: RawTree<FixedPool<K, V, N>>,
}

impl<K: Copy + Ord, V: Copy, const N: usize> FixedMap<K, V, N> {
    pub fn new() -> Self {
        Self::with_comparator(Ord::cmp)
    }
}

impl<K: Copy, V: Copy, const N: usize> FixedMap<K, V, N> {
    pub fn with_comparator(compare: Comparator<K>) -> Self {
        Self {
            tree: RawTree::new(FixedPool::new(), compare),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        N
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

    pub fn insert(&mut self, key: K, value: V) -> Result<InsertOutcome, MapError> {
        self.tree.insert_with(key, value, |k, v| (k, v))
    }

    pub fn put(&mut self, key: K, value: V) -> Result<PutOutcome, MapError> {
        let node = self.tree.find_node(&key);
        if node.is_null() {
            return self.insert(key, value).map(|_| PutOutcome::Inserted);
        }
        *self.tree.nodes.value_mut(node) = value;
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
            Some(_) => EraseOutcome::Erased,
            None => EraseOutcome::NotFound,
        }
    }

    pub fn clear(&mut self) {
        let released = self.tree.drain_with(|_, _| {});
        if released > 0 {
            debug!(released, "fixed map cleared");
        }
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

    pub fn begin(&self) -> Cursor {
        Cursor(self.tree.first())
    }

    pub fn end(&self) -> Cursor {
        Cursor::END
    }

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
    pub(crate) fn raw(&self) -> &RawTree<FixedPool<K, V, N>> {
        &self.tree
    }
}

impl<K: Copy + Ord, V: Copy, const N: usize> Default for FixedMap<K, V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K: Copy, V: Copy, const N: usize> IntoIterator for &'a FixedMap<K, V, N> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Copy + fmt::Debug, V: Copy + fmt::Debug, const N: usize> fmt::Debug for FixedMap<K, V, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
