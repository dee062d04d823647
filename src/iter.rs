use std::iter::FusedIterator;

use crate::engine::{self, Ptr};
use crate::tree::{NodeStore, RawTree, Slot};

/// Position of one entry, or the end sentinel.
///
/// A cursor does not borrow the map. It stays meaningful until the next
/// insert, put of a new key, erase or clear; after that it may point at a
/// different entry or read as the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor(pub(crate) Ptr);

impl Cursor {
    pub const END: Cursor = Cursor(Ptr::NULL);

    #[inline]
    pub fn is_end(self) -> bool {
        self.0.is_null()
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::END
    }
}

/// In-order iterator over `(&key, &value)`, usable from both ends.
///
/// The same type serves both backends, so it can be named in caller code:
///
/// ```rust
/// use avl_rs::{FixedMap, HeapMap, InsertOutcome, Iter};
///
/// struct Merge<'a> {
///     left: Iter<'a, u32, u32>,
///     right: Iter<'a, u32, u32>,
/// }
///
/// let mut heap: HeapMap<u32, u32> = HeapMap::new();
/// let mut fixed: FixedMap<u32, u32, 4> = FixedMap::new();
/// assert_eq!(heap.insert(1, 10), Ok(InsertOutcome::Inserted));
/// assert_eq!(fixed.insert(2, 20), Ok(InsertOutcome::Inserted));
///
/// let mut merge = Merge { left: heap.iter(), right: fixed.iter() };
/// assert_eq!(merge.left.next(), Some((&1, &10)));
/// assert_eq!(merge.right.next_back(), Some((&2, &20)));
/// assert_eq!(merge.left.len() + merge.right.len(), 0);
/// ```
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    front: Ptr,
    back: Ptr,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new<S>(tree: &'a RawTree<S>) -> Self
    where
        S: NodeStore<Key = K, Value = V>,
    {
        Self {
            slots: tree.nodes.slots(),
            front: tree.first(),
            back: tree.last(),
            remaining: tree.len(),
        }
    }

    fn entry(&self, node: Ptr) -> Option<(&'a K, &'a V)> {
        let slots = self.slots;
        let (key, value) = slots.get(node.index())?.entry.as_ref()?;
        Some((key, value))
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front;
        self.front = engine::successor(self.slots, node);
        self.remaining -= 1;
        self.entry(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back;
        self.back = engine::predecessor(self.slots, node);
        self.remaining -= 1;
        self.entry(node)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}
