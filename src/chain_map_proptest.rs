#![cfg(test)]

// Property tests for ChainMap kept inside the crate so they can reach the
// slot codec and check the arena's link invariants directly.

use crate::chain_map::ChainMap;
use crate::config::MapConfig;
use crate::crc::{bucket_for, key_hash};
use crate::error::MapError;
use crate::key::CStrKey;
use crate::slot::Link;
use hashbrown::HashMap;
use proptest::prelude::*;
use std::collections::BTreeSet;

const KEY_SIZE: usize = 8;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, u32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, u32),
    Iterate,
    IterateBucket(usize),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (1usize..=8, proptest::collection::vec("[a-z]{0,7}", 1..=12)).prop_flat_map(
        |(capacity, pool)| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let contains_pool = proptest::sample::select(pool.clone());
            let op = prop_oneof![
                4 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Set(i, v)),
                2 => idx.clone().prop_map(OpI::Remove),
                2 => idx.clone().prop_map(OpI::Get),
                1 => prop_oneof![
                    contains_pool.prop_map(|s: String| s),
                    "[a-z]{0,9}".prop_map(|s| s)
                ]
                .prop_map(OpI::Contains),
                1 => (idx.clone(), any::<u32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
                1 => Just(OpI::Iterate),
                1 => (0usize..10).prop_map(OpI::IterateBucket),
                1 => Just(OpI::Clear),
            ];
            proptest::collection::vec(op, 1..80).prop_map(move |ops| (capacity, pool.clone(), ops))
        },
    )
}

/// Walk the raw arena and check every structural invariant of the chains.
fn check_structure<const B: usize>(
    m: &ChainMap<'_, CStrKey, B>,
) -> Result<(), TestCaseError> {
    let layout = m.layout;
    let mut reached = vec![false; m.capacity()];
    for bucket in 0..B {
        let mut cur = match m.buckets[bucket] {
            -1 => continue,
            h => h as usize,
        };
        loop {
            prop_assert!(cur < m.capacity(), "link out of range");
            prop_assert!(!reached[cur], "slot {} reached twice", cur);
            reached[cur] = true;
            let hash = layout.hash(&m.arena, cur);
            prop_assert_eq!(bucket_for(hash, B), bucket, "slot chained into wrong bucket");
            match layout.link(&m.arena, cur) {
                Link::Next(next) => cur = next as usize,
                Link::TailOf(b) => {
                    prop_assert_eq!(b as usize, bucket, "tail carries wrong bucket");
                    break;
                }
                Link::Free => prop_assert!(false, "free slot inside a chain"),
            }
        }
    }
    for (slot, &in_chain) in reached.iter().enumerate() {
        let free = layout.link(&m.arena, slot).is_free();
        prop_assert_eq!(free, !in_chain, "slot {} free/chained mismatch", slot);
    }
    prop_assert_eq!(reached.iter().filter(|&&r| r).count(), m.len());
    for slot in 0..m.free_hint.min(m.capacity()) {
        prop_assert!(!layout.link(&m.arena, slot).is_free(), "free slot below hint");
    }
    Ok(())
}

// Invariants exercised across random operation sequences:
// - `get` after `set` returns the value until the next set/remove/clear.
// - New keys beyond capacity fail with CapacityExceeded and change nothing.
// - `len` equals the model's size and never exceeds capacity.
// - `iter` visits each live key exactly once; `bucket_iter(b)` yields the
//   subset hashing to `b`.
// - Raw chains stay well formed after every step.
fn run_state_machine<const B: usize>(
    capacity: usize,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut sut: ChainMap<'static, CStrKey, B> =
        ChainMap::new(MapConfig::new(KEY_SIZE, 4).with_capacity(capacity)).unwrap();
    let mut model: HashMap<Vec<u8>, u32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = pool[i].as_bytes();
                let known = model.contains_key(k);
                match sut.set(k, &v.to_le_bytes()) {
                    Ok(()) => {
                        prop_assert!(known || model.len() < capacity);
                        model.insert(k.to_vec(), v);
                    }
                    Err(MapError::CapacityExceeded { capacity: c }) => {
                        prop_assert_eq!(c, capacity);
                        prop_assert!(!known, "updates never need a free slot");
                        prop_assert_eq!(model.len(), capacity);
                    }
                    Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                }
            }
            OpI::Remove(i) => {
                let k = pool[i].as_bytes();
                let removed = sut.remove(k);
                prop_assert_eq!(removed, model.remove(k).is_some());
                prop_assert!(sut.get(k).is_none());
            }
            OpI::Get(i) => {
                let k = pool[i].as_bytes();
                let expected = model.get(k).map(|v| v.to_le_bytes());
                prop_assert_eq!(sut.get(k), expected.as_ref().map(|v| &v[..]));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(s.as_bytes()));
            }
            OpI::Mutate(i, d) => {
                let k = pool[i].as_bytes();
                if let Some(slot) = sut.get_mut(k) {
                    let cur = u32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]);
                    let next = cur.wrapping_add(d);
                    slot.copy_from_slice(&next.to_le_bytes());
                    let mv = model.get_mut(k).expect("present in model");
                    prop_assert_eq!(*mv, cur);
                    *mv = next;
                } else {
                    prop_assert!(!model.contains_key(k));
                }
            }
            OpI::Iterate => {
                let visited: Vec<Vec<u8>> = sut.iter().map(|e| e.key().to_vec()).collect();
                let unique: BTreeSet<_> = visited.iter().cloned().collect();
                prop_assert_eq!(visited.len(), unique.len(), "entry visited twice");
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(unique, m_keys);
                for e in sut.iter() {
                    prop_assert_eq!(e.value(), &model[e.key()].to_le_bytes()[..]);
                }
            }
            OpI::IterateBucket(b) => {
                let in_bucket: BTreeSet<Vec<u8>> =
                    sut.bucket_iter(b).map(|e| e.key().to_vec()).collect();
                let expected: BTreeSet<Vec<u8>> = model
                    .keys()
                    .filter(|k| bucket_for(key_hash(k.as_slice()), B) == b)
                    .cloned()
                    .collect();
                prop_assert_eq!(in_bucket, expected);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.len() <= sut.capacity());
        check_structure(&sut)?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((capacity, pool, ops) in arb_scenario()) {
        run_state_machine::<8>(capacity, &pool, ops)?;
    }

    // Worst-case collisions: a single bucket turns the map into one chain,
    // stressing splice-out at head, middle and tail.
    #[test]
    fn prop_state_machine_single_bucket((capacity, pool, ops) in arb_scenario()) {
        run_state_machine::<1>(capacity, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_three_buckets((capacity, pool, ops) in arb_scenario()) {
        run_state_machine::<3>(capacity, &pool, ops)?;
    }
}
