// ChainMap property tests (public API).
//
// Property 1: binary-keyed table matches a HashMap model.
//  - Keys: 3-byte arrays drawn from a tiny alphabet that includes zero, so
//    keys differing only after a zero byte are common.
//  - Operations: set, remove, get, full iteration, per-bucket iteration.
//  - Invariant after each step: len() == model.len() <= capacity; a
//    CapacityExceeded error happens iff the key is new and the map is full.
//
// Property 2: fixed-mode write bounds.
//  - Model: a canary-filled buffer of arbitrary length.
//  - Invariant: after any operation sequence (and drop), bytes at or past
//    capacity * stride still hold the canary.
use arena_dict::{MapError, Table, HEADER_SIZE};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn arb_key() -> impl Strategy<Value = [u8; 3]> {
    proptest::array::uniform3(prop_oneof![Just(0u8), Just(1u8), Just(0xFFu8)])
}

// Property 1: table equivalence with a model map.
proptest! {
    #[test]
    fn prop_table_matches_model(
        capacity in 1usize..=10,
        ops in proptest::collection::vec((0u8..=4u8, arb_key(), any::<u16>()), 1..120)
    ) {
        let mut t = Table::new(arena_dict::MapConfig::new(3, 2).with_capacity(capacity)).unwrap();
        let mut model: BTreeMap<[u8; 3], u16> = BTreeMap::new();

        for (op, key, v) in ops {
            match op {
                // Upsert.
                0 | 1 => {
                    let new = !model.contains_key(&key);
                    match t.set(key, &v.to_le_bytes()) {
                        Ok(()) => { model.insert(key, v); }
                        Err(MapError::CapacityExceeded { .. }) => {
                            prop_assert!(new && model.len() == capacity);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                }
                // Remove (no-op when absent).
                2 => {
                    prop_assert_eq!(t.remove(key), model.remove(&key).is_some());
                }
                // Point lookup.
                3 => {
                    let want = model.get(&key).map(|v| v.to_le_bytes());
                    prop_assert_eq!(t.get(key), want.as_ref().map(|w| &w[..]));
                }
                // Full pass and per-bucket passes.
                4 => {
                    let all: Vec<[u8; 3]> = t
                        .iter()
                        .map(|e| [e.key()[0], e.key()[1], e.key()[2]])
                        .collect();
                    prop_assert_eq!(all.len(), t.len());
                    let set: BTreeSet<_> = all.iter().copied().collect();
                    prop_assert_eq!(set.len(), all.len());
                    prop_assert_eq!(set, model.keys().copied().collect::<BTreeSet<_>>());

                    let mut by_bucket = Vec::new();
                    for b in 0..t.bucket_count() {
                        for e in t.bucket_iter(b) {
                            prop_assert_eq!(t.bucket_of(e.key()), Some(b));
                            by_bucket.push([e.key()[0], e.key()[1], e.key()[2]]);
                        }
                    }
                    prop_assert_eq!(by_bucket, all);
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(t.len(), model.len());
            prop_assert!(t.len() <= t.capacity());
        }
    }
}

// Property 2: a fixed map never touches bytes past its used prefix.
proptest! {
    #[test]
    fn prop_fixed_mode_stays_in_bounds(
        buf_len in 0usize..200,
        ops in proptest::collection::vec((any::<bool>(), arb_key()), 0..60)
    ) {
        const CANARY: u8 = 0x5A;
        let mut buf = vec![CANARY; buf_len];
        let stride = HEADER_SIZE + 3 + 1;
        let used = (buf_len / stride) * stride;
        {
            let mut t = Table::fixed(&mut buf, 3, 1).unwrap();
            prop_assert_eq!(t.capacity(), buf_len / stride);
            for (insert, key) in ops {
                if insert {
                    let _ = t.set(key, &[key[0]]);
                } else {
                    t.remove(key);
                }
            }
            t.destroy();
        }
        prop_assert!(buf[used..].iter().all(|&b| b == CANARY));
    }
}
