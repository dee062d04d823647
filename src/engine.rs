//! Height-balance bookkeeping shared by every node store.
//!
//! Nothing in here knows where nodes live or what they carry. A store only has
//! to hand out the [`NodeLinks`] record for a [`Ptr`], and the rotations, the
//! rebalance walk and in-order stepping all work on top of that.

use tracing::trace;

// =============================================================================
// Pointer type
// =============================================================================

/// Slot index into a node store.
///
/// `u32::MAX` is reserved for NULL (absent child, absent parent, end cursor).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ptr(u32);

impl Ptr {
    pub const NULL: Ptr = Ptr(u32::MAX);

    /// Number of addressable slots; NULL takes the last index.
    pub const MAX_SLOTS: usize = u32::MAX as usize;

    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index < Self::MAX_SLOTS);
        Self(index as u32)
    }

    /// `None` once `index` would collide with NULL or not fit in 32 bits.
    #[inline]
    pub fn try_new(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .filter(|&i| i != u32::MAX)
            .map(Self)
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

impl std::fmt::Debug for Ptr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("NULL")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Structural relations of one node.
///
/// `parent` is a back-reference for walking upward only; ownership flows
/// strictly from the root down through `left`/`right`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeLinks {
    pub left: Ptr,
    pub right: Ptr,
    pub parent: Ptr,
    /// 1 for a leaf. 0 only while the slot is detached.
    pub height: u8,
}

impl NodeLinks {
    pub const DETACHED: NodeLinks = NodeLinks {
        left: Ptr::NULL,
        right: Ptr::NULL,
        parent: Ptr::NULL,
        height: 0,
    };

    pub const LEAF: NodeLinks = NodeLinks {
        height: 1,
        ..Self::DETACHED
    };
}

/// Access to the relations of nodes addressed by [`Ptr`].
///
/// Callers never pass NULL to `links`/`links_mut`.
pub trait Links {
    fn links(&self, node: Ptr) -> &NodeLinks;
    fn links_mut(&mut self, node: Ptr) -> &mut NodeLinks;

    #[inline]
    fn left(&self, node: Ptr) -> Ptr {
        self.links(node).left
    }

    #[inline]
    fn right(&self, node: Ptr) -> Ptr {
        self.links(node).right
    }

    #[inline]
    fn parent(&self, node: Ptr) -> Ptr {
        self.links(node).parent
    }

    #[inline]
    fn set_left(&mut self, node: Ptr, child: Ptr) {
        self.links_mut(node).left = child;
    }

    #[inline]
    fn set_right(&mut self, node: Ptr, child: Ptr) {
        self.links_mut(node).right = child;
    }

    #[inline]
    fn set_parent(&mut self, node: Ptr, parent: Ptr) {
        self.links_mut(node).parent = parent;
    }
}

// =============================================================================
// Heights and rotations
// =============================================================================

#[inline]
pub fn height<L: Links + ?Sized>(links: &L, node: Ptr) -> u8 {
    if node.is_null() {
        0
    } else {
        links.links(node).height
    }
}

#[inline]
pub fn update_height<L: Links + ?Sized>(links: &mut L, node: Ptr) {
    if node.is_null() {
        return;
    }
    let h = height(links, links.left(node)).max(height(links, links.right(node)));
    links.links_mut(node).height = h + 1;
}

/// `height(left) - height(right)`.
#[inline]
pub fn balance_factor<L: Links + ?Sized>(links: &L, node: Ptr) -> i16 {
    i16::from(height(links, links.left(node))) - i16::from(height(links, links.right(node)))
}

/// Rotate `y` down to the right; its left child takes its place.
///
/// The parent's child slot still names `y` afterwards; use [`set_child`] with
/// the returned subtree root.
pub fn rotate_right<L: Links + ?Sized>(links: &mut L, y: Ptr) -> Ptr {
    let x = links.left(y);
    debug_assert!(!x.is_null(), "rotate_right needs a left child");
    let inner = links.right(x);

    links.set_right(x, y);
    links.set_left(y, inner);
    if !inner.is_null() {
        links.set_parent(inner, y);
    }

    let above = links.parent(y);
    links.set_parent(x, above);
    links.set_parent(y, x);

    update_height(links, y);
    update_height(links, x);
    x
}

/// Mirror of [`rotate_right`].
pub fn rotate_left<L: Links + ?Sized>(links: &mut L, x: Ptr) -> Ptr {
    let y = links.right(x);
    debug_assert!(!y.is_null(), "rotate_left needs a right child");
    let inner = links.left(y);

    links.set_left(y, x);
    links.set_right(x, inner);
    if !inner.is_null() {
        links.set_parent(inner, x);
    }

    let above = links.parent(x);
    links.set_parent(y, above);
    links.set_parent(x, y);

    update_height(links, x);
    update_height(links, y);
    y
}

/// Restore the balance bound at `node` and return whichever node now occupies
/// its position.
pub fn rebalance_at<L: Links + ?Sized>(links: &mut L, node: Ptr) -> Ptr {
    update_height(links, node);
    let balance = balance_factor(links, node);

    if balance > 1 {
        let left = links.left(node);
        if height(links, links.left(left)) < height(links, links.right(left)) {
            trace!(?node, "rebalance LR");
            let pivot = rotate_left(links, left);
            links.set_left(node, pivot);
        } else {
            trace!(?node, "rebalance LL");
        }
        return rotate_right(links, node);
    }

    if balance < -1 {
        let right = links.right(node);
        if height(links, links.right(right)) < height(links, links.left(right)) {
            trace!(?node, "rebalance RL");
            let pivot = rotate_right(links, right);
            links.set_right(node, pivot);
        } else {
            trace!(?node, "rebalance RR");
        }
        return rotate_left(links, node);
    }

    node
}

/// Point `parent`'s slot that held `old` at `new` (or the root if `parent` is
/// NULL) and fix `new`'s back-reference.
pub fn set_child<L: Links + ?Sized>(links: &mut L, root: &mut Ptr, parent: Ptr, old: Ptr, new: Ptr) {
    if parent.is_null() {
        *root = new;
    } else if links.left(parent) == old {
        links.set_left(parent, new);
    } else {
        debug_assert_eq!(links.right(parent), old);
        links.set_right(parent, new);
    }
    if !new.is_null() {
        links.set_parent(new, parent);
    }
}

/// Rebalance every ancestor from `start` up to the root.
///
/// The next level is read from the rebalanced subtree root, since a rotation
/// may have moved `start` below a new node.
pub fn rebalance_walk<L: Links + ?Sized>(links: &mut L, root: &mut Ptr, start: Ptr) {
    let mut current = start;
    while !current.is_null() {
        let parent = links.parent(current);
        let subroot = rebalance_at(links, current);
        set_child(links, root, parent, current, subroot);
        current = links.parent(subroot);
    }
}

// =============================================================================
// In-order stepping
// =============================================================================

pub fn subtree_min<L: Links + ?Sized>(links: &L, mut node: Ptr) -> Ptr {
    if node.is_null() {
        return node;
    }
    while !links.left(node).is_null() {
        node = links.left(node);
    }
    node
}

pub fn subtree_max<L: Links + ?Sized>(links: &L, mut node: Ptr) -> Ptr {
    if node.is_null() {
        return node;
    }
    while !links.right(node).is_null() {
        node = links.right(node);
    }
    node
}

/// Next node in key order, or NULL after the maximum.
pub fn successor<L: Links + ?Sized>(links: &L, node: Ptr) -> Ptr {
    if node.is_null() {
        return Ptr::NULL;
    }
    let right = links.right(node);
    if !right.is_null() {
        return subtree_min(links, right);
    }
    let mut current = node;
    let mut parent = links.parent(current);
    while !parent.is_null() && links.right(parent) == current {
        current = parent;
        parent = links.parent(current);
    }
    parent
}

/// Previous node in key order, or NULL before the minimum.
pub fn predecessor<L: Links + ?Sized>(links: &L, node: Ptr) -> Ptr {
    if node.is_null() {
        return Ptr::NULL;
    }
    let left = links.left(node);
    if !left.is_null() {
        return subtree_max(links, left);
    }
    let mut current = node;
    let mut parent = links.parent(current);
    while !parent.is_null() && links.left(parent) == current {
        current = parent;
        parent = links.parent(current);
    }
    parent
}
