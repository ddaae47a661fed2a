#![cfg(test)]

// Property tests for OrderedStore kept inside the crate so they can reach
// the crate-private structural layer.

use crate::error::MapError;
use crate::ordered_store::OrderedStore;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    RemoveIf(usize, i32),
    Replace(usize, i32),
    Position(usize),
    Contains(String),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            // Small values so the equality gate is hit often.
            1 => (idx.clone(), 0..3i32).prop_map(|(i, v)| OpI::RemoveIf(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Replace(i, v)),
            2 => idx.clone().prop_map(OpI::Position),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Model: a Vec of (key, value) in insertion order. Position of a key is its
// index in the Vec, which is exactly the contract the store must keep.
fn run_state_machine<S: BuildHasher>(
    sut: &mut OrderedStore<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: Vec<(Key, i32)> = Vec::new();
    let model_pos = |model: &Vec<(Key, i32)>, k: &Key| model.iter().position(|(mk, _)| mk == k);

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model_pos(&model, &k).is_some();
                match sut.insert(k.clone(), v) {
                    Ok(position) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert_eq!(position, model.len(), "insert appends at the tail");
                        model.push((k, v));
                    }
                    Err(e) => {
                        prop_assert_eq!(e, MapError::DuplicateKey);
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                match (sut.remove(&k), model_pos(&model, &k)) {
                    (Some((position, kk, vv)), Some(mp)) => {
                        prop_assert_eq!(position, mp);
                        let (mk, mv) = model.remove(mp);
                        prop_assert!(kk == mk);
                        prop_assert_eq!(vv, mv);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "remove mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::RemoveIf(i, v) => {
                let k = key_from(pool, i);
                let expected = model_pos(&model, &k).filter(|&p| model[p].1 == v);
                let got = sut.remove_if(&k, |stored| *stored == v);
                prop_assert_eq!(got.as_ref().map(|(p, _, _)| *p), expected);
                if let Some(p) = expected {
                    model.remove(p);
                }
            }
            OpI::Replace(i, v) => {
                let k = key_from(pool, i);
                if let Some(p) = model_pos(&model, &k) {
                    let position = sut.position_of(&k);
                    prop_assert_eq!(position, Some(p));
                    let old = sut.replace_at(p, v);
                    prop_assert_eq!(old, Some(model[p].1));
                    model[p].1 = v;
                } else {
                    prop_assert!(sut.position_of(&k).is_none());
                }
            }
            OpI::Position(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.position_of(&k), model_pos(&model, &k));
                prop_assert_eq!(sut.get(&k), model_pos(&model, &k).map(|p| &model[p].1));
            }
            OpI::Contains(s) => {
                let has = sut.position_of(s.as_str()).is_some();
                let has_model = model.iter().any(|(k, _)| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Iterate => {
                let s_entries: Vec<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&s_entries, &model);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        for (p, (k, v)) in model.iter().enumerate() {
            prop_assert_eq!(sut.get_index(p), Some((k, v)));
        }
        sut.assert_consistent();
    }
    Ok(())
}

// Property: state-machine equivalence against an insertion-ordered Vec.
// Invariants exercised across random operation sequences:
// - Duplicate keys are rejected; successful inserts land at position len.
// - Removal returns the owned `(K, V)` at the model position and shifts
//   later positions down by one.
// - `remove_if` only removes when the stored value matches.
// - Replacement keeps the position.
// - Iteration order equals the model order; the index stays a bijection
//   onto `0..len`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: OrderedStore<Key, i32> = OrderedStore::new();
        run_state_machine(&mut sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants as above under worst-case collisions. This
// stresses equality probing and the compaction of colliding slots.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: OrderedStore<Key, i32, ConstBuildHasher> =
            OrderedStore::with_capacity_and_hasher(0, ConstBuildHasher);
        run_state_machine(&mut sut, &pool, ops)?;
    }
}
