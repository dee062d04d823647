//! Construction-time configuration: key ordering and ownership policies.

use std::cmp::Ordering;

use crate::error::MapError;
use crate::heap::HeapMap;
use crate::pool::FixedMap;

/// Three-way key comparison. Must be a total order.
pub type Comparator<K> = fn(&K, &K) -> Ordering;

/// What the map does with a key or value handed to it.
pub enum Ownership<T> {
    /// Store the value as given. Nothing runs when it leaves the map.
    Borrow,
    /// Store `duplicate(&value)` instead of the argument, and pass that stored
    /// copy to `release` exactly once when it leaves the map.
    DeepCopy {
        duplicate: fn(&T) -> T,
        release: fn(T),
    },
}

impl<T> Ownership<T> {
    #[inline]
    pub(crate) fn store(&self, item: T) -> T {
        match self {
            Ownership::Borrow => item,
            Ownership::DeepCopy { duplicate, .. } => duplicate(&item),
        }
    }

    #[inline]
    pub(crate) fn release(&self, item: T) {
        if let Ownership::DeepCopy { release, .. } = self {
            release(item);
        }
    }

    pub fn is_borrow(&self) -> bool {
        matches!(self, Ownership::Borrow)
    }
}

impl<T: Clone> Ownership<T> {
    /// Deep copy through `Clone`, released by dropping.
    pub fn cloned() -> Self {
        Ownership::DeepCopy {
            duplicate: T::clone,
            release: drop,
        }
    }
}

impl<T> Clone for Ownership<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ownership<T> {}

impl<T> Default for Ownership<T> {
    fn default() -> Self {
        Ownership::Borrow
    }
}

impl<T> std::fmt::Debug for Ownership<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ownership::Borrow => f.write_str("Borrow"),
            Ownership::DeepCopy { .. } => f.write_str("DeepCopy"),
        }
    }
}

/// Builder for both map backends.
///
/// ```rust
/// use avl_rs::{InsertOutcome, MapBuilder, Ownership};
///
/// let mut map = MapBuilder::new()
///     .compare(|a: &String, b: &String| a.cmp(b))
///     .key_ownership(Ownership::cloned())
///     .build()
///     .unwrap();
/// assert_eq!(map.insert("apple".to_string(), 42u32), Ok(InsertOutcome::Inserted));
/// assert_eq!(map.find(&"apple".to_string()), Some(&42));
/// ```
pub struct MapBuilder<K, V> {
    compare: Option<Comparator<K>>,
    keys: Ownership<K>,
    values: Ownership<V>,
}

impl<K, V> MapBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            compare: None,
            keys: Ownership::Borrow,
            values: Ownership::Borrow,
        }
    }

    pub fn compare(mut self, compare: Comparator<K>) -> Self {
        self.compare = Some(compare);
        self
    }

    pub fn key_ownership(mut self, keys: Ownership<K>) -> Self {
        self.keys = keys;
        self
    }

    pub fn value_ownership(mut self, values: Ownership<V>) -> Self {
        self.values = values;
        self
    }

    /// Heap-backed map with the configured policies.
    pub fn build(self) -> Result<HeapMap<K, V>, MapError> {
        let compare = self.compare.ok_or(MapError::MissingComparator)?;
        Ok(HeapMap::from_parts(compare, self.keys, self.values))
    }

    /// Fixed-capacity map with `N` slots. Only `Borrow` ownership is accepted.
    pub fn build_fixed<const N: usize>(self) -> Result<FixedMap<K, V, N>, MapError>
    where
        K: Copy,
        V: Copy,
    {
        let compare = self.compare.ok_or(MapError::MissingComparator)?;
        if !self.keys.is_borrow() || !self.values.is_borrow() {
            return Err(MapError::OwnershipUnsupported);
        }
        Ok(FixedMap::with_comparator(compare))
    }
}

impl<K, V> Default for MapBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
