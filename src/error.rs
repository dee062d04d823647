use std::collections::TryReserveError;

use thiserror::Error;

/// Failures reported by map construction and mutation.
///
/// A failed mutation leaves the map exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapError {
    /// The builder was finished without a key comparator.
    #[error("a key comparator is required")]
    MissingComparator,
    /// The heap-backed slab could not grow by one node.
    #[error("node allocation failed: {0}")]
    AllocationFailed(#[from] TryReserveError),
    /// The heap-backed slab already holds as many slots as a node index can
    /// address.
    #[error("node index space exhausted (limit {limit} slots)")]
    IndexSpaceExhausted { limit: usize },
    /// Every slot of a fixed pool is in use.
    #[error("node pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },
    /// Fixed pools copy keys and values by assignment and take no ownership policy.
    #[error("ownership policies are not supported by the fixed-capacity pool")]
    OwnershipUnsupported,
}

/// Result of `insert`.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key was already stored; nothing changed.
    AlreadyPresent,
}

/// Result of `put`.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// The key was already stored and its value was swapped for the new one.
    Replaced,
}

/// Result of `erase`.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EraseOutcome {
    Erased,
    NotFound,
}
