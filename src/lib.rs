//! arena-dict: a fixed-capacity chained hash map that lives entirely in
//! one contiguous byte arena, linked by slot indices instead of pointers.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: chained hashing without per-node allocation, usable from a
//!   caller-provided buffer (no heap at all) or a single heap arena.
//! - Layers (leaves first):
//!   - `crc`: CRC-32 of the significant key bytes, folded to 16 bits.
//!   - `slot`: codec for one fixed-stride record
//!     `link | hash | key | value` at a given index.
//!   - `key`: `KeyKind` strategies deciding which key bytes matter:
//!     `CStrKey` (zero-terminated strings) and `FixedKey` (binary keys).
//!   - `arena`: owned (`Dynamic`) or borrowed (`Fixed`) byte storage and
//!     the `ArenaAllocator` contract.
//!   - `ChainMap<K, B>`: bucket table of `B` chain heads plus the arena;
//!     implements lookup, upsert, remove and two cursor-based iterations.
//!
//! Slot links
//! - Each slot has one signed 16-bit link:
//!   - `-1`: free.
//!   - `-(b + 2)`: tail of bucket `b`'s chain.
//!   - `>= 0`: index of the next slot in the same chain.
//! - Because a tail records its own bucket, global iteration can hop from
//!   the end of one chain to the next non-empty bucket without extra state.
//!
//! Constraints
//! - Capacity is fixed at creation; a full map fails closed with
//!   `MapError::CapacityExceeded`. Grow by building a larger map.
//! - At most `i16::MAX` slots and buckets (links are 16-bit).
//! - Single-threaded: no internal locking. Maps are `Send` but not `Sync`;
//!   wrap one in a lock to share it.
//! - Every fallible mutation validates first and writes second, so a
//!   failed call leaves the map exactly as it was.
//!
//! Ordering
//! - Iteration is grouped by ascending bucket; within a bucket entries come
//!   in insertion order. There is no global insertion order.
//! - Slot indices are not stable across remove + insert: new keys take the
//!   lowest free slot.
//!
//! Reentrancy
//! - Every public operation holds a debug-only guard; re-entering the same
//!   map from a `KeyKind` callback panics in debug builds.
//!
//! Logging
//! - Creation, destruction and capacity failures are reported through
//!   `tracing` at debug level; per-slot activity at trace level.

mod arena;
mod chain_map;
mod chain_map_proptest;
mod config;
mod crc;
mod error;
mod key;
mod reentrancy;
mod slot;

// Public surface
pub use arena::{ArenaAllocator, Global, MemoryMode};
pub use chain_map::{BucketIter, ChainMap, Cursor, Dictionary, Entry, Iter, Table};
pub use config::{MapConfig, DEFAULT_BUCKETS, DICT_KEY_SIZE, MAX_BUCKETS, MAX_CAPACITY};
pub use crc::{crc32, key_hash};
pub use error::{MapError, Result};
pub use key::{CStrKey, FixedKey, KeyKind};
pub use slot::HEADER_SIZE;

// Compiles the README examples as doctests.
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
