//! ChainMap: fixed-capacity chained hash map over a single byte arena.

use crate::arena::{Arena, ArenaAllocator, Global, MemoryMode};
use crate::config::{MapConfig, DEFAULT_BUCKETS, MAX_CAPACITY};
use crate::crc::{bucket_for, key_hash};
use crate::error::{MapError, Result};
use crate::key::{CStrKey, FixedKey, KeyKind};
use crate::reentrancy::DebugReentrancy;
use crate::slot::{Link, SlotLayout};
use core::fmt;
use core::marker::PhantomData;
use tracing::{debug, trace};

const EMPTY: i16 = -1;

/// Map with zero-terminated string keys (up to 31 bytes by default).
pub type Dictionary<'a> = ChainMap<'a, CStrKey>;

/// Map with fixed-width binary keys.
pub type Table<'a> = ChainMap<'a, FixedKey>;

/// Position of an entry returned by `iterate_all`/`iterate_bucket`.
///
/// Pass it back to resume after that entry. Cursors are plain slot indices:
/// they are invalidated by any mutation of the map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor(u16);

impl Cursor {
    /// Arena slot index of the entry this cursor points at.
    pub fn slot(&self) -> usize {
        self.0 as usize
    }
}

/// Borrowed view of one live slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Entry<'m> {
    key: &'m [u8],
    value: &'m [u8],
    bucket: usize,
    slot: usize,
}

impl<'m> Entry<'m> {
    /// Significant key bytes (without the terminator for string keys).
    pub fn key(&self) -> &'m [u8] {
        self.key
    }

    /// Value bytes, always `value_size` long.
    pub fn value(&self) -> &'m [u8] {
        self.value
    }

    /// Bucket whose chain holds this entry.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Arena slot index; not stable across remove and insert.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Result of a chain walk: where the key lives and what points at it.
struct Found {
    slot: usize,
    prev: Option<usize>,
    bucket: usize,
}

pub struct ChainMap<'a, K, const B: usize = { DEFAULT_BUCKETS }> {
    pub(crate) arena: Arena<'a>,
    pub(crate) buckets: [i16; B],
    pub(crate) layout: SlotLayout,
    capacity: usize,
    len: usize,
    // Every slot below this index is occupied.
    pub(crate) free_hint: usize,
    reentrancy: DebugReentrancy,
    _kind: PhantomData<fn() -> K>,
}

impl<K: KeyKind, const B: usize> ChainMap<'static, K, B> {
    /// Allocate an arena for `config.capacity` slots on the heap.
    pub fn new(config: MapConfig) -> Result<Self> {
        Self::with_allocator(config, &Global)
    }

    pub fn with_allocator<A>(config: MapConfig, alloc: &A) -> Result<Self>
    where
        A: ArenaAllocator + ?Sized,
    {
        config.validate::<K, B>()?;
        let bytes = config
            .arena_bytes()
            .ok_or_else(|| MapError::InvalidConfig("arena size overflows usize".into()))?;
        let buf = match alloc.allocate(bytes) {
            Some(buf) if buf.len() >= bytes => buf,
            _ => {
                debug!("arena allocation of {} bytes failed", bytes);
                return Err(MapError::AllocationFailed { bytes });
            }
        };
        Ok(Self::from_arena(Arena::Owned(buf), config))
    }
}

impl<'a, K: KeyKind, const B: usize> ChainMap<'a, K, B> {
    /// Lay the map out in a caller-owned buffer.
    ///
    /// Capacity is `buf.len() / stride` (capped at `MAX_CAPACITY`); bytes
    /// past `capacity * stride` are never touched.
    pub fn fixed(buf: &'a mut [u8], key_size: usize, value_size: usize) -> Result<Self> {
        let stride = SlotLayout::new(key_size, value_size)
            .checked_stride()
            .ok_or_else(|| MapError::InvalidConfig("slot stride overflows usize".into()))?;
        let capacity = (buf.len() / stride).min(MAX_CAPACITY);
        let config = MapConfig::new(key_size, value_size).with_capacity(capacity);
        config.validate::<K, B>()?;
        Ok(Self::from_arena(Arena::Borrowed(buf), config))
    }

    fn from_arena(arena: Arena<'a>, config: MapConfig) -> Self {
        let mut map = Self {
            arena,
            buckets: [EMPTY; B],
            layout: config.layout(),
            capacity: config.capacity,
            len: 0,
            free_hint: 0,
            reentrancy: DebugReentrancy::new(),
            _kind: PhantomData,
        };
        for i in 0..map.capacity {
            map.layout.set_link(&mut map.arena, i, Link::Free);
        }
        debug!(
            "created {:?} map: capacity {}, stride {}, {} buckets",
            map.arena.mode(),
            map.capacity,
            map.layout.stride(),
            B
        );
        map
    }

    /// Release the map. Dynamic arenas are freed; a fixed buffer is simply
    /// handed back to its owner.
    pub fn destroy(self) {
        debug!(
            "destroying {:?} map with {} live entries",
            self.arena.mode(),
            self.len
        );
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bucket_count(&self) -> usize {
        B
    }

    pub fn key_size(&self) -> usize {
        self.layout.key_size()
    }

    pub fn value_size(&self) -> usize {
        self.layout.value_size()
    }

    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    pub fn mode(&self) -> MemoryMode {
        self.arena.mode()
    }

    /// Bucket a key hashes to, or `None` if the key could never be stored.
    pub fn bucket_of(&self, key: impl AsRef<[u8]>) -> Option<usize> {
        let key = key.as_ref();
        K::check(key, self.layout.key_size()).ok()?;
        Some(bucket_for(key_hash(K::significant(key)), B))
    }

    #[inline]
    fn head(&self, bucket: usize) -> Option<usize> {
        match self.buckets[bucket] {
            EMPTY => None,
            idx => Some(idx as usize),
        }
    }

    fn first_nonempty_from(&self, bucket: usize) -> Option<usize> {
        (bucket..B).find_map(|b| self.head(b))
    }

    fn find(&self, key: &[u8]) -> Option<Found> {
        K::check(key, self.layout.key_size()).ok()?;
        let sig = K::significant(key);
        let hash = key_hash(sig);
        let bucket = bucket_for(hash, B);

        let mut cur = self.head(bucket)?;
        let mut prev = None;
        loop {
            if self.layout.hash(&self.arena, cur) == hash
                && K::stored(self.layout.key(&self.arena, cur)) == sig
            {
                return Some(Found {
                    slot: cur,
                    prev,
                    bucket,
                });
            }
            match self.layout.link(&self.arena, cur) {
                Link::Next(next) => {
                    prev = Some(cur);
                    cur = next as usize;
                }
                _ => return None,
            }
        }
    }

    /// Lowest free slot index.
    fn find_free(&self) -> Option<usize> {
        (self.free_hint..self.capacity).find(|&i| self.layout.link(&self.arena, i).is_free())
    }

    fn tail_from(&self, head: usize) -> usize {
        let mut cur = head;
        while let Link::Next(next) = self.layout.link(&self.arena, cur) {
            cur = next as usize;
        }
        cur
    }

    fn entry_at(&self, slot: usize) -> Entry<'_> {
        let layout = self.layout;
        Entry {
            key: K::stored(layout.key(&self.arena, slot)),
            value: layout.value(&self.arena, slot),
            bucket: bucket_for(layout.hash(&self.arena, slot), B),
            slot,
        }
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        let _g = self.reentrancy.enter("get");
        let found = self.find(key.as_ref())?;
        Some(self.layout.value(&self.arena, found.slot))
    }

    pub fn get_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut [u8]> {
        let _g = self.reentrancy.enter("get_mut");
        let found = self.find(key.as_ref())?;
        Some(self.layout.value_mut(&mut self.arena, found.slot))
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        let _g = self.reentrancy.enter("contains_key");
        self.find(key.as_ref()).is_some()
    }

    /// Insert `key`, or overwrite its value in place if already present.
    ///
    /// The key, the value width and slot availability are all checked before
    /// any byte is written, so a failed call leaves the map unchanged.
    pub fn set(&mut self, key: impl AsRef<[u8]>, value: &[u8]) -> Result<()> {
        let key = key.as_ref();
        let _g = self.reentrancy.enter("set");
        let layout = self.layout;

        K::check(key, layout.key_size())?;
        if value.len() != layout.value_size() {
            return Err(MapError::ValueSizeMismatch {
                expected: layout.value_size(),
                actual: value.len(),
            });
        }

        if let Some(found) = self.find(key) {
            layout
                .value_mut(&mut self.arena, found.slot)
                .copy_from_slice(value);
            trace!("overwrote slot {}", found.slot);
            return Ok(());
        }

        let Some(slot) = self.find_free() else {
            debug!("insert rejected: all {} slots in use", self.capacity);
            return Err(MapError::CapacityExceeded {
                capacity: self.capacity,
            });
        };

        let hash = key_hash(K::significant(key));
        let bucket = bucket_for(hash, B);

        K::store(key, layout.key_mut(&mut self.arena, slot));
        layout.value_mut(&mut self.arena, slot).copy_from_slice(value);
        layout.set_hash(&mut self.arena, slot, hash);
        layout.set_link(&mut self.arena, slot, Link::TailOf(bucket as u16));

        // The old tail's sentinel is replaced by a link; the new slot carries it now.
        match self.head(bucket) {
            None => self.buckets[bucket] = slot as i16,
            Some(head) => {
                let tail = self.tail_from(head);
                layout.set_link(&mut self.arena, tail, Link::Next(slot as u16));
            }
        }

        self.len += 1;
        self.free_hint = slot + 1;
        trace!("inserted into slot {} (bucket {})", slot, bucket);
        Ok(())
    }

    /// Remove `key` if present. Returns whether an entry was removed.
    ///
    /// The freed slot's key and value bytes are left as they were.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> bool {
        let _g = self.reentrancy.enter("remove");
        let layout = self.layout;
        let Some(found) = self.find(key.as_ref()) else {
            return false;
        };

        let link = layout.link(&self.arena, found.slot);
        match (found.prev, link) {
            (Some(prev), link) => layout.set_link(&mut self.arena, prev, link),
            (None, Link::Next(next)) => self.buckets[found.bucket] = next as i16,
            (None, _) => self.buckets[found.bucket] = EMPTY,
        }
        layout.set_link(&mut self.arena, found.slot, Link::Free);

        self.len -= 1;
        self.free_hint = self.free_hint.min(found.slot);
        trace!("removed slot {} (bucket {})", found.slot, found.bucket);
        true
    }

    /// Drop every entry. The arena itself is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        let layout = self.layout;
        for i in 0..self.capacity {
            layout.set_link(&mut self.arena, i, Link::Free);
        }
        self.buckets = [EMPTY; B];
        self.len = 0;
        self.free_hint = 0;
        trace!("cleared map");
    }

    /// Entry after `cursor` in bucket order, or the first entry for `None`.
    ///
    /// Buckets are visited in ascending order; each chain in insertion order.
    pub fn iterate_all(&self, cursor: Option<Cursor>) -> Option<(Entry<'_>, Cursor)> {
        let _g = self.reentrancy.enter("iterate_all");
        let next = match cursor {
            None => self.first_nonempty_from(0)?,
            Some(c) if c.slot() < self.capacity => match self.layout.link(&self.arena, c.slot()) {
                Link::Next(next) => next as usize,
                Link::TailOf(bucket) => self.first_nonempty_from(bucket as usize + 1)?,
                Link::Free => return None,
            },
            Some(_) => return None,
        };
        Some((self.entry_at(next), Cursor(next as u16)))
    }

    /// Entry after `cursor` within `bucket`, or the bucket's head for `None`.
    pub fn iterate_bucket(
        &self,
        bucket: usize,
        cursor: Option<Cursor>,
    ) -> Option<(Entry<'_>, Cursor)> {
        let _g = self.reentrancy.enter("iterate_bucket");
        if bucket >= B {
            return None;
        }
        let next = match cursor {
            None => self.head(bucket)?,
            Some(c) if c.slot() < self.capacity => match self.layout.link(&self.arena, c.slot()) {
                Link::Next(next) => next as usize,
                _ => return None,
            },
            Some(_) => return None,
        };
        Some((self.entry_at(next), Cursor(next as u16)))
    }

    pub fn iter(&self) -> Iter<'_, 'a, K, B> {
        Iter {
            map: self,
            cursor: None,
            remaining: self.len,
        }
    }

    pub fn bucket_iter(&self, bucket: usize) -> BucketIter<'_, 'a, K, B> {
        BucketIter {
            map: self,
            bucket,
            cursor: None,
            done: false,
        }
    }
}

impl<K: KeyKind, const B: usize> fmt::Debug for ChainMap<'_, K, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainMap")
            .field("mode", &self.arena.mode())
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("stride", &self.layout.stride())
            .field("buckets", &self.buckets)
            .finish()
    }
}

/// Iterator over every live entry, grouped by ascending bucket.
pub struct Iter<'m, 'a, K, const B: usize> {
    map: &'m ChainMap<'a, K, B>,
    cursor: Option<Cursor>,
    remaining: usize,
}

impl<'m, 'a, K: KeyKind, const B: usize> Iterator for Iter<'m, 'a, K, B> {
    type Item = Entry<'m>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (entry, cursor) = self.map.iterate_all(self.cursor)?;
        self.cursor = Some(cursor);
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: KeyKind, const B: usize> ExactSizeIterator for Iter<'_, '_, K, B> {}

/// Iterator over one bucket's chain, head first.
pub struct BucketIter<'m, 'a, K, const B: usize> {
    map: &'m ChainMap<'a, K, B>,
    bucket: usize,
    cursor: Option<Cursor>,
    done: bool,
}

impl<'m, 'a, K: KeyKind, const B: usize> Iterator for BucketIter<'m, 'a, K, B> {
    type Item = Entry<'m>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.map.iterate_bucket(self.bucket, self.cursor) {
            Some((entry, cursor)) => {
                self.cursor = Some(cursor);
                Some(entry)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl<'m, 'a, K: KeyKind, const B: usize> IntoIterator for &'m ChainMap<'a, K, B> {
    type Item = Entry<'m>;
    type IntoIter = Iter<'m, 'a, K, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
