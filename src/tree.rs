//! Map operations written once against an abstract node store.
//!
//! `RawTree` owns the root, the element count and the comparator; the store
//! owns the slots. Both backends wrap a `RawTree` and only decide how a slot
//! is obtained and what happens to payloads on the way in and out.

use std::cmp::Ordering;

use crate::config::Comparator;
use crate::engine::{self, Links, NodeLinks, Ptr};
use crate::error::{InsertOutcome, MapError};

/// One node slot: relations plus an optional payload (`None` means free).
#[derive(Clone, Debug)]
pub struct Slot<K, V> {
    pub links: NodeLinks,
    pub entry: Option<(K, V)>,
}

impl<K, V> Slot<K, V> {
    pub fn vacant() -> Self {
        Self {
            links: NodeLinks::DETACHED,
            entry: None,
        }
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.entry.is_some()
    }
}

/// Read-only walks (iteration) only need the slot slice itself.
impl<K, V> Links for [Slot<K, V>] {
    #[inline]
    fn links(&self, node: Ptr) -> &NodeLinks {
        &self[node.index()].links
    }

    #[inline]
    fn links_mut(&mut self, node: Ptr) -> &mut NodeLinks {
        &mut self[node.index()].links
    }
}

/// Slot storage behind a [`RawTree`].
///
/// `claim` must not change anything observable: if the caller bails out
/// after a successful claim, the store is as before.
pub trait NodeStore: Links {
    type Key;
    type Value;

    fn slots(&self) -> &[Slot<Self::Key, Self::Value>];
    fn slots_mut(&mut self) -> &mut [Slot<Self::Key, Self::Value>];

    /// Find room for one more node without occupying it.
    fn claim(&mut self) -> Result<Ptr, MapError>;

    /// Fill a slot returned by the last `claim`, as a detached leaf.
    fn occupy(&mut self, at: Ptr, key: Self::Key, value: Self::Value);

    /// Reset the slot's relations, mark it free and hand back its payload.
    fn vacate(&mut self, at: Ptr) -> (Self::Key, Self::Value);

    /// Forget every slot at once. Payloads must already have been taken.
    fn reset(&mut self);

    #[inline]
    fn is_live(&self, node: Ptr) -> bool {
        !node.is_null()
            && self
                .slots()
                .get(node.index())
                .is_some_and(Slot::is_occupied)
    }

    #[inline]
    fn entry(&self, node: Ptr) -> &(Self::Key, Self::Value) {
        self.slots()[node.index()]
            .entry
            .as_ref()
            .expect("reachable node must be occupied")
    }

    #[inline]
    fn key(&self, node: Ptr) -> &Self::Key {
        &self.entry(node).0
    }

    #[inline]
    fn value(&self, node: Ptr) -> &Self::Value {
        &self.entry(node).1
    }

    #[inline]
    fn value_mut(&mut self, node: Ptr) -> &mut Self::Value {
        &mut self.slots_mut()[node.index()]
            .entry
            .as_mut()
            .expect("reachable node must be occupied")
            .1
    }

    /// Exchange the payloads of two live nodes, leaving their relations alone.
    fn swap_payload(&mut self, a: Ptr, b: Ptr) {
        let slots = self.slots_mut();
        let taken = slots[a.index()].entry.take();
        slots[a.index()].entry = slots[b.index()].entry.take();
        slots[b.index()].entry = taken;
    }
}

/// Where a key lives, or where it would be attached.
enum Search {
    Found(Ptr),
    Vacant { parent: Ptr, side: Ordering },
}

#[derive(Clone)]
pub struct RawTree<S: NodeStore> {
    pub(crate) nodes: S,
    pub(crate) root: Ptr,
    pub(crate) len: usize,
    compare: Comparator<S::Key>,
}

impl<S: NodeStore> RawTree<S> {
    pub fn new(nodes: S, compare: Comparator<S::Key>) -> Self {
        Self {
            nodes,
            root: Ptr::NULL,
            len: 0,
            compare,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn compare(&self) -> Comparator<S::Key> {
        self.compare
    }

    fn search(&self, key: &S::Key) -> Search {
        let mut parent = Ptr::NULL;
        let mut side = Ordering::Equal;
        let mut current = self.root;
        while !current.is_null() {
            side = (self.compare)(key, self.nodes.key(current));
            match side {
                Ordering::Equal => return Search::Found(current),
                Ordering::Less => {
                    parent = current;
                    current = self.nodes.left(current);
                }
                Ordering::Greater => {
                    parent = current;
                    current = self.nodes.right(current);
                }
            }
        }
        Search::Vacant { parent, side }
    }

    pub fn find_node(&self, key: &S::Key) -> Ptr {
        match self.search(key) {
            Search::Found(node) => node,
            Search::Vacant { .. } => Ptr::NULL,
        }
    }

    pub fn find(&self, key: &S::Key) -> Option<&S::Value> {
        let node = self.find_node(key);
        (!node.is_null()).then(|| self.nodes.value(node))
    }

    /// Insert unless `key` is present.
    ///
    /// `store` turns the caller's key/value into what gets kept; it only runs
    /// once a slot is secured, so a failed claim changes nothing.
    pub fn insert_with<F>(
        &mut self,
        key: S::Key,
        value: S::Value,
        store: F,
    ) -> Result<InsertOutcome, MapError>
    where
        F: FnOnce(S::Key, S::Value) -> (S::Key, S::Value),
    {
        let (parent, side) = match self.search(&key) {
            Search::Found(_) => return Ok(InsertOutcome::AlreadyPresent),
            Search::Vacant { parent, side } => (parent, side),
        };

        let node = self.nodes.claim()?;
        let (key, value) = store(key, value);
        self.nodes.occupy(node, key, value);

        if parent.is_null() {
            self.root = node;
        } else {
            if side == Ordering::Less {
                self.nodes.set_left(parent, node);
            } else {
                self.nodes.set_right(parent, node);
            }
            self.nodes.set_parent(node, parent);
        }
        self.len += 1;

        engine::rebalance_walk(&mut self.nodes, &mut self.root, parent);
        Ok(InsertOutcome::Inserted)
    }

    /// Detach the node holding `key` and return its payload.
    pub fn erase(&mut self, key: &S::Key) -> Option<(S::Key, S::Value)> {
        let node = self.find_node(key);
        if node.is_null() {
            return None;
        }
        let (removed, parent) = self.unlink(node);
        let entry = self.nodes.vacate(removed);
        self.len -= 1;
        engine::rebalance_walk(&mut self.nodes, &mut self.root, parent);
        Some(entry)
    }

    /// Splice `node` out of the tree, returning the slot that was actually
    /// detached and the parent where rebalancing starts.
    ///
    /// A node with two children trades payloads with its in-order successor,
    /// which has no left child, and the successor's slot is detached instead.
    fn unlink(&mut self, mut node: Ptr) -> (Ptr, Ptr) {
        let right = self.nodes.right(node);
        if !self.nodes.left(node).is_null() && !right.is_null() {
            let successor = engine::subtree_min(&self.nodes, right);
            self.nodes.swap_payload(node, successor);
            node = successor;
        }

        let left = self.nodes.left(node);
        let child = if left.is_null() {
            self.nodes.right(node)
        } else {
            left
        };
        debug_assert!(left.is_null() || self.nodes.right(node).is_null());

        let parent = self.nodes.parent(node);
        engine::set_child(&mut self.nodes, &mut self.root, parent, node, child);
        (node, parent)
    }

    /// Take every payload out, children before parents, and empty the tree.
    pub fn drain_with<F>(&mut self, mut sink: F) -> usize
    where
        F: FnMut(S::Key, S::Value),
    {
        let mut released = 0;
        let mut stack = Vec::new();
        if !self.root.is_null() {
            stack.push((self.root, false));
        }
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                let (key, value) = self.nodes.vacate(node);
                sink(key, value);
                released += 1;
                continue;
            }
            stack.push((node, true));
            for child in [self.nodes.right(node), self.nodes.left(node)] {
                if !child.is_null() {
                    stack.push((child, false));
                }
            }
        }
        debug_assert_eq!(released, self.len);
        self.nodes.reset();
        self.root = Ptr::NULL;
        self.len = 0;
        released
    }

    pub fn first(&self) -> Ptr {
        engine::subtree_min(&self.nodes, self.root)
    }

    pub fn last(&self) -> Ptr {
        engine::subtree_max(&self.nodes, self.root)
    }

    /// In-order successor; stale or end positions step to the end.
    pub fn next(&self, node: Ptr) -> Ptr {
        if !self.nodes.is_live(node) {
            return Ptr::NULL;
        }
        engine::successor(&self.nodes, node)
    }

    pub fn prev(&self, node: Ptr) -> Ptr {
        if !self.nodes.is_live(node) {
            return Ptr::NULL;
        }
        engine::predecessor(&self.nodes, node)
    }

    pub fn entry_at(&self, node: Ptr) -> Option<(&S::Key, &S::Value)> {
        if !self.nodes.is_live(node) {
            return None;
        }
        let (key, value) = self.nodes.entry(node);
        Some((key, value))
    }
}
