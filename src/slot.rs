//! Slot codec: one fixed-stride record inside the arena.
//!
//! ```text
//! | link: i16 LE | hash: u16 LE | key: key_size | value: value_size |
//! ```
//!
//! The link field is a tagged union packed into one signed integer:
//! `-1` is a free slot, `-(b + 2)` is the tail of bucket `b`, and any
//! non-negative value is the index of the next slot in the chain.

/// Size of the link field in bytes.
pub const LINK_SIZE: usize = 2;
/// Size of the stored hash in bytes.
pub const HASH_SIZE: usize = 2;
/// Header preceding the key in every slot.
pub const HEADER_SIZE: usize = LINK_SIZE + HASH_SIZE;

const FREE: i16 = -1;

/// Decoded form of a slot's link field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Link {
    Free,
    /// Last node of the chain for this bucket.
    TailOf(u16),
    /// Index of the next node in the same chain.
    Next(u16),
}

impl Link {
    #[inline]
    pub fn decode(raw: i16) -> Self {
        match raw {
            FREE => Link::Free,
            r if r >= 0 => Link::Next(r as u16),
            r => Link::TailOf((-(r as i32) - 2) as u16),
        }
    }

    #[inline]
    pub fn encode(self) -> i16 {
        match self {
            Link::Free => FREE,
            Link::TailOf(b) => (-(b as i32) - 2) as i16,
            Link::Next(i) => i as i16,
        }
    }

    pub fn is_free(self) -> bool {
        matches!(self, Link::Free)
    }
}

/// Byte geometry shared by every slot of one map.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SlotLayout {
    key_size: usize,
    value_size: usize,
}

impl SlotLayout {
    pub const fn new(key_size: usize, value_size: usize) -> Self {
        Self {
            key_size,
            value_size,
        }
    }

    #[inline]
    pub const fn stride(&self) -> usize {
        HEADER_SIZE + self.key_size + self.value_size
    }

    /// `stride`, or `None` when the widths overflow `usize`.
    pub fn checked_stride(&self) -> Option<usize> {
        HEADER_SIZE
            .checked_add(self.key_size)?
            .checked_add(self.value_size)
    }

    pub const fn key_size(&self) -> usize {
        self.key_size
    }

    pub const fn value_size(&self) -> usize {
        self.value_size
    }

    #[inline]
    fn base(&self, idx: usize) -> usize {
        idx * self.stride()
    }

    #[inline]
    fn key_range(&self, idx: usize) -> core::ops::Range<usize> {
        let start = self.base(idx) + HEADER_SIZE;
        start..start + self.key_size
    }

    #[inline]
    fn value_range(&self, idx: usize) -> core::ops::Range<usize> {
        let start = self.base(idx) + HEADER_SIZE + self.key_size;
        start..start + self.value_size
    }

    #[inline]
    pub fn link(&self, arena: &[u8], idx: usize) -> Link {
        let at = self.base(idx);
        Link::decode(i16::from_le_bytes([arena[at], arena[at + 1]]))
    }

    #[inline]
    pub fn set_link(&self, arena: &mut [u8], idx: usize, link: Link) {
        let at = self.base(idx);
        arena[at..at + LINK_SIZE].copy_from_slice(&link.encode().to_le_bytes());
    }

    #[inline]
    pub fn hash(&self, arena: &[u8], idx: usize) -> u16 {
        let at = self.base(idx) + LINK_SIZE;
        u16::from_le_bytes([arena[at], arena[at + 1]])
    }

    #[inline]
    pub fn set_hash(&self, arena: &mut [u8], idx: usize, hash: u16) {
        let at = self.base(idx) + LINK_SIZE;
        arena[at..at + HASH_SIZE].copy_from_slice(&hash.to_le_bytes());
    }

    #[inline]
    pub fn key<'a>(&self, arena: &'a [u8], idx: usize) -> &'a [u8] {
        &arena[self.key_range(idx)]
    }

    #[inline]
    pub fn key_mut<'a>(&self, arena: &'a mut [u8], idx: usize) -> &'a mut [u8] {
        &mut arena[self.key_range(idx)]
    }

    #[inline]
    pub fn value<'a>(&self, arena: &'a [u8], idx: usize) -> &'a [u8] {
        &arena[self.value_range(idx)]
    }

    #[inline]
    pub fn value_mut<'a>(&self, arena: &'a mut [u8], idx: usize) -> &'a mut [u8] {
        &mut arena[self.value_range(idx)]
    }
}
