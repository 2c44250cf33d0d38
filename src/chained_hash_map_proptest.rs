#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// the record store / bucket index bijection after every step.

use crate::chained_hash_map::{ChainedHashMap, Handle};
use crate::error::KeyNotFound;
use core::hash::BuildHasher;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;

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
    RemoveHandle(usize),
    Find(usize),
    At(String),
    GetOrInsertDefault(usize, i32),
    Retain(i32),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let at_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveHandle),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![at_pool.prop_map(|s: String| s), "[a-z]{0,5}".prop_map(|s| s)]
                .prop_map(OpI::At),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::GetOrInsertDefault(i, d)),
            1 => (1i32..4).prop_map(OpI::Retain),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Reference model: a std HashMap for contents plus a Vec for first-insertion
// order, and the handle each live key was given.
#[derive(Default)]
struct Model {
    values: HashMap<Key, i32>,
    order: Vec<Key>,
    live: HashMap<Key, Handle>,
    stale: Vec<Handle>,
}

impl Model {
    fn remove(&mut self, k: &Key) {
        self.values.remove(k);
        self.order.retain(|o| o != k);
        if let Some(h) = self.live.remove(k) {
            self.stale.push(h);
        }
    }
}

// Drive one scenario against any hasher; returns the first violated property.
fn run_scenario<S: BuildHasher>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model = Model::default();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.values.contains_key(&k);
                let (h, fresh) = sut.insert_full(k.clone(), v);
                prop_assert_eq!(fresh, !already, "insert is fresh iff key absent");
                if fresh {
                    model.values.insert(k.clone(), v);
                    model.order.push(k.clone());
                    model.live.insert(k, h);
                } else {
                    prop_assert_eq!(
                        Some(&h),
                        model.live.get(&k),
                        "duplicate returns existing handle"
                    );
                    prop_assert_eq!(h.value(&sut), model.values.get(&k), "first write wins");
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let got = sut.remove(&k);
                prop_assert_eq!(got, model.values.get(&k).copied());
                model.remove(&k);
                prop_assert!(sut.find(&k).is_none());
            }
            OpI::RemoveHandle(i) => {
                let k = key_from(pool, i);
                if let Some(&h) = model.live.get(&k) {
                    let (kk, vv) = sut.remove_handle(h).expect("live handle removes");
                    prop_assert!(kk == k);
                    prop_assert_eq!(Some(vv), model.values.get(&k).copied());
                    model.remove(&k);
                } else if let Some(&h) = model.stale.last() {
                    prop_assert!(
                        sut.remove_handle(h).is_none(),
                        "stale handle must not remove"
                    );
                }
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found, model.live.get(&k).copied());
                prop_assert_eq!(sut.at(&k).ok(), model.values.get(&k));
            }
            OpI::At(s) => {
                let expected = model
                    .values
                    .iter()
                    .find(|(k, _)| k.0 == s)
                    .map(|(_, v)| v);
                match sut.at(s.as_str()) {
                    Ok(v) => {
                        prop_assert_eq!(Some(v), expected);
                    }
                    Err(KeyNotFound) => {
                        prop_assert!(expected.is_none());
                    }
                }
            }
            OpI::GetOrInsertDefault(i, d) => {
                let k = key_from(pool, i);
                let before = sut.len();
                let v = sut.get_or_insert_default(k.clone());
                *v = v.wrapping_add(d);
                let now = *v;
                if model.values.contains_key(&k) {
                    prop_assert_eq!(sut.len(), before, "hit must not insert");
                } else {
                    prop_assert_eq!(sut.len(), before + 1, "miss inserts exactly once");
                    model.order.push(k.clone());
                    let h = sut.find(&k).expect("just inserted");
                    model.live.insert(k.clone(), h);
                }
                let mv = model.values.entry(k).or_default();
                *mv = mv.wrapping_add(d);
                prop_assert_eq!(now, *mv);
            }
            OpI::Retain(m) => {
                sut.retain(|_, v| v.rem_euclid(m) == 0);
                let dropped: Vec<Key> = model
                    .values
                    .iter()
                    .filter(|(_, v)| v.rem_euclid(m) != 0)
                    .map(|(k, _)| k.clone())
                    .collect();
                for k in &dropped {
                    model.remove(k);
                }
            }
            OpI::Clear => {
                sut.clear();
                prop_assert_eq!(sut.table_size(), crate::DEFAULT_TABLE_SIZE);
                let keys: Vec<Key> = model.order.clone();
                for k in &keys {
                    model.remove(k);
                }
            }
            OpI::Iterate => {
                let got: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let want: Vec<(Key, i32)> = model
                    .order
                    .iter()
                    .map(|k| (k.clone(), model.values[k]))
                    .collect();
                prop_assert_eq!(got, want);
            }
        }

        // Post-conditions after each op
        for &h in &model.stale {
            prop_assert!(h.value(&sut).is_none(), "stale handle resolved");
        }
        for (k, &h) in &model.live {
            prop_assert_eq!(h.key(&sut), Some(k));
        }
        let keys: Vec<&Key> = sut.keys().collect();
        let want: Vec<&Key> = model.order.iter().collect();
        prop_assert_eq!(keys, want, "insertion order");
        prop_assert_eq!(sut.len(), model.values.len());
        prop_assert_eq!(sut.is_empty(), model.values.is_empty());
        sut.assert_consistent();
    }
    Ok(())
}

// Property: state-machine equivalence against the model.
// Invariants exercised across random operation sequences:
// - Uniqueness and first-write-wins on duplicate insert.
// - `find`/`at` agree with the model; `at` fails only with KeyNotFound.
// - Iteration order equals first-insertion order of surviving keys.
// - Removal (by key, handle, retain, clear) shrinks `len` and stales handles.
// - Record store and bucket index stay in bijection.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution
// and force a rehash on nearly every insert.
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

// Low-entropy variant: only 3 distinct hash values, so several chains are
// shared and rehashes leave collisions behind.
#[derive(Clone, Default)]
struct TinyBuildHasher;
struct TinyHasher(u64);
impl BuildHasher for TinyBuildHasher {
    type Hasher = TinyHasher;
    fn build_hasher(&self) -> Self::Hasher {
        TinyHasher(0)
    }
}
impl Hasher for TinyHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_add(b as u64);
        }
    }
    fn finish(&self) -> u64 {
        (self.0 % 3) * 1024
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_low_entropy_hash((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::with_hasher(TinyBuildHasher), &pool, ops)?;
    }
}
