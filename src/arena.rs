//! Byte arena backing every slot of a map, plus the allocation contract.

use core::ops::{Deref, DerefMut};

/// Who owns the arena bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MemoryMode {
    /// The map allocated the arena and releases it when dropped.
    Dynamic,
    /// The caller lent the buffer; the map never frees it.
    Fixed,
}

/// Source of arena memory for dynamically allocated maps.
///
/// The map asks for exactly one buffer at creation and never grows it, so
/// there is no reallocation hook. Memory goes back to the global heap when
/// the returned box is dropped.
pub trait ArenaAllocator {
    /// Return a zero-filled buffer of `len` bytes, or `None` if it cannot
    /// be provided.
    fn allocate(&self, len: usize) -> Option<Box<[u8]>>;
}

/// Heap allocator that reports failure instead of aborting.
#[derive(Copy, Clone, Debug, Default)]
pub struct Global;

impl ArenaAllocator for Global {
    fn allocate(&self, len: usize) -> Option<Box<[u8]>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).ok()?;
        buf.resize(len, 0);
        Some(buf.into_boxed_slice())
    }
}

#[derive(Debug)]
pub(crate) enum Arena<'a> {
    Owned(Box<[u8]>),
    Borrowed(&'a mut [u8]),
}

impl Arena<'_> {
    pub(crate) fn mode(&self) -> MemoryMode {
        match self {
            Arena::Owned(_) => MemoryMode::Dynamic,
            Arena::Borrowed(_) => MemoryMode::Fixed,
        }
    }
}

impl Deref for Arena<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Arena::Owned(b) => b,
            Arena::Borrowed(b) => b,
        }
    }
}

impl DerefMut for Arena<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Arena::Owned(b) => b,
            Arena::Borrowed(b) => b,
        }
    }
}
