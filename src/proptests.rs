use super::*;

use crate::engine::{self, NodeLinks, Ptr};
use crate::tree::{NodeStore, RawTree};

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Walk the whole tree and assert every structural invariant.
pub(crate) fn validate_tree<S: NodeStore>(t: &RawTree<S>) {
    let compare = t.compare();
    let mut reachable = 0usize;

    if !t.root.is_null() {
        assert!(t.nodes.is_live(t.root), "root must be an occupied slot");
        assert_eq!(t.nodes.parent(t.root), Ptr::NULL, "root must have no parent");
    }

    // (node, lower bound, upper bound) in key order.
    let mut stack: Vec<(Ptr, Ptr, Ptr)> = Vec::new();
    if !t.root.is_null() {
        stack.push((t.root, Ptr::NULL, Ptr::NULL));
    }
    while let Some((node, lo, hi)) = stack.pop() {
        assert!(t.nodes.is_live(node), "reachable node must be occupied");
        reachable += 1;
        let key = t.nodes.key(node);
        if !lo.is_null() {
            assert_eq!(
                compare(t.nodes.key(lo), key),
                Ordering::Less,
                "left-subtree ancestor bound violated"
            );
        }
        if !hi.is_null() {
            assert_eq!(
                compare(key, t.nodes.key(hi)),
                Ordering::Less,
                "right-subtree ancestor bound violated"
            );
        }

        let left = t.nodes.left(node);
        let right = t.nodes.right(node);
        let hl = engine::height(&t.nodes, left);
        let hr = engine::height(&t.nodes, right);
        assert_eq!(
            t.nodes.links(node).height,
            hl.max(hr) + 1,
            "stored node height must match children"
        );
        assert!(
            (i16::from(hl) - i16::from(hr)).abs() <= 1,
            "balance factor out of range at {node:?}"
        );

        for (child, lo, hi) in [(left, lo, node), (right, node, hi)] {
            if child.is_null() {
                continue;
            }
            assert_eq!(t.nodes.parent(child), node, "parent back-reference mismatch");
            stack.push((child, lo, hi));
        }
    }

    assert_eq!(reachable, t.len(), "reachable node count must match len");

    let occupied = t.nodes.slots().iter().filter(|s| s.is_occupied()).count();
    assert_eq!(occupied, t.len(), "every occupied slot must be reachable");
    for slot in t.nodes.slots().iter().filter(|s| !s.is_occupied()) {
        assert_eq!(slot.links, NodeLinks::DETACHED, "free slot must be reset");
    }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 12)]
    Insert(u8, u32),
    #[proptest(weight = 8)]
    Put(u8, u32),
    #[proptest(weight = 10)]
    Erase(u8),
    #[proptest(weight = 10)]
    Find(u8),
    Clear,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=400)
}

const POOL: usize = 48;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 20_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_heap(ops in ops_strategy()) {
        let mut t: HeapMap<u8, u32> = HeapMap::new();
        let mut m: BTreeMap<u8, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let expected = if m.contains_key(&key) {
                        InsertOutcome::AlreadyPresent
                    } else {
                        m.insert(key, value);
                        InsertOutcome::Inserted
                    };
                    prop_assert_eq!(t.insert(key, value), Ok(expected));
                }
                Op::Put(key, value) => {
                    let expected = match m.insert(key, value) {
                        Some(_) => PutOutcome::Replaced,
                        None => PutOutcome::Inserted,
                    };
                    prop_assert_eq!(t.put(key, value), Ok(expected));
                }
                Op::Erase(key) => {
                    let expected = match m.remove(&key) {
                        Some(_) => EraseOutcome::Erased,
                        None => EraseOutcome::NotFound,
                    };
                    prop_assert_eq!(t.erase(&key), expected);
                    prop_assert_eq!(t.find(&key), None);
                }
                Op::Find(key) => {
                    prop_assert_eq!(t.find(&key), m.get(&key));
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
            validate_tree(t.raw());
        }

        let got: Vec<(u8, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u8, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_equivalence_fixed(ops in ops_strategy()) {
        let mut t: FixedMap<u8, u32, POOL> = FixedMap::new();
        let mut m: BTreeMap<u8, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) | Op::Put(key, value)
                    if !m.contains_key(&key) && m.len() == POOL =>
                {
                    let exhausted = MapError::PoolExhausted { capacity: POOL };
                    if matches!(op, Op::Insert(..)) {
                        prop_assert_eq!(t.insert(key, value), Err(exhausted));
                    } else {
                        prop_assert_eq!(t.put(key, value), Err(exhausted));
                    }
                }
                Op::Insert(key, value) => {
                    let expected = if m.contains_key(&key) {
                        InsertOutcome::AlreadyPresent
                    } else {
                        m.insert(key, value);
                        InsertOutcome::Inserted
                    };
                    prop_assert_eq!(t.insert(key, value), Ok(expected));
                }
                Op::Put(key, value) => {
                    let expected = match m.insert(key, value) {
                        Some(_) => PutOutcome::Replaced,
                        None => PutOutcome::Inserted,
                    };
                    prop_assert_eq!(t.put(key, value), Ok(expected));
                }
                Op::Erase(key) => {
                    let expected = match m.remove(&key) {
                        Some(_) => EraseOutcome::Erased,
                        None => EraseOutcome::NotFound,
                    };
                    prop_assert_eq!(t.erase(&key), expected);
                }
                Op::Find(key) => {
                    prop_assert_eq!(t.find(&key), m.get(&key));
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert!(t.len() <= t.capacity());
            prop_assert_eq!(t.len(), m.len());
            validate_tree(t.raw());
        }

        let got: Vec<(u8, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u8, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_cursor_steps_are_inverse(keys in prop::collection::btree_set(any::<u16>(), 1..200)) {
        let mut t: HeapMap<u16, ()> = HeapMap::new();
        for &k in &keys {
            prop_assert_eq!(t.insert(k, ()), Ok(InsertOutcome::Inserted));
        }

        let mut forward = Vec::new();
        let mut it = t.begin();
        while !it.is_end() {
            let next = t.next(it);
            if !next.is_end() {
                prop_assert_eq!(t.prev(next), it);
            }
            forward.push(*t.key(it).unwrap());
            it = next;
        }
        prop_assert_eq!(forward, keys.iter().copied().collect::<Vec<_>>());
        prop_assert!(t.prev(t.begin()).is_end());
        prop_assert!(t.next(t.last_cursor()).is_end());
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u32> = vec![10, 20, 30, 40, 50, 60, 70];

    for_each_permutation(&keys, |perm| {
        let mut t: FixedMap<u32, u32, 7> = FixedMap::new();
        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i as u32), Ok(InsertOutcome::Inserted));
        }

        validate_tree(t.raw());
        assert!(engine::height(&t.raw().nodes, t.raw().root) <= 4);
        let got: Vec<u32> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, keys);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u32> = vec![1, 2, 3, 4, 5, 6, 7];

    // Insert in a fixed order, then remove in all permutations.
    let mut base: FixedMap<u32, u32, 7> = FixedMap::new();
    for &k in &keys {
        assert_eq!(base.insert(k, k * 100), Ok(InsertOutcome::Inserted));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut m: BTreeMap<u32, u32> = keys.iter().map(|&k| (k, k * 100)).collect();

        for k in perm {
            assert_eq!(t.erase(&k), EraseOutcome::Erased);
            m.remove(&k);
            assert_eq!(t.len(), m.len());
            validate_tree(t.raw());
            let got: Vec<(u32, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
            let expected: Vec<(u32, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
            assert_eq!(got, expected);
        }
        assert_eq!(t.len(), 0);
        assert!(t.raw().root.is_null());
    });
}
