//! # avl-rs
//!
//! A height-balanced (AVL) ordered map over an index arena.
//!
//! Two storage backends share one balancing core:
//!
//! - [`HeapMap`]: unbounded slab of node slots, with optional deep-copy
//!   ownership of keys and values ([`Ownership`]).
//! - [`FixedMap`]: `N` inline slots, no allocation, plain `Copy` payloads.
//!
//! Every mutation reports a distinguishable outcome; allocation failure and
//! pool exhaustion leave the map untouched.
//!
//! ## Example
//!
//! ```rust
//! use avl_rs::{HeapMap, InsertOutcome, PutOutcome};
//!
//! let mut map: HeapMap<&str, u32> = HeapMap::new();
//! assert_eq!(map.insert("apple", 42), Ok(InsertOutcome::Inserted));
//! assert_eq!(map.insert("apple", 7), Ok(InsertOutcome::AlreadyPresent));
//! assert_eq!(map.put("apple", 100), Ok(PutOutcome::Replaced));
//! assert_eq!(map.find(&"apple"), Some(&100));
//!
//! let mut it = map.begin();
//! while it != map.end() {
//!     println!("{:?} -> {:?}", map.key(it), map.value(it));
//!     it = map.next(it);
//! }
//! ```

#![forbid(unsafe_code)]

mod config;
mod engine;
mod error;
mod heap;
mod iter;
mod pool;
mod tree;

pub use config::{Comparator, MapBuilder, Ownership};
pub use error::{EraseOutcome, InsertOutcome, MapError, PutOutcome};
pub use heap::HeapMap;
pub use iter::{Cursor, Iter};
pub use pool::FixedMap;


#[cfg(test)]
mod proptests;
