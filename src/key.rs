//! Key strategies: which bytes of a key matter and how they are stored.
//!
//! A `ChainMap` never inspects keys directly. It asks its `KeyKind` for the
//! significant bytes (those fed to the hash and compared for equality), for
//! validation before anything is written, and for the encoding into the
//! slot's fixed-size key field.

use crate::error::{MapError, Result};

pub trait KeyKind {
    /// Smallest key field this strategy can work with.
    const MIN_KEY_SIZE: usize;

    /// Bytes of `key` that take part in hashing and equality.
    fn significant(key: &[u8]) -> &[u8];

    /// Reject keys that cannot be stored in a field of `key_size` bytes.
    fn check(key: &[u8], key_size: usize) -> Result<()>;

    /// Write an already checked key into the slot's key field.
    fn store(key: &[u8], field: &mut [u8]);

    /// Significant bytes of a key as stored in a slot.
    fn stored(field: &[u8]) -> &[u8] {
        Self::significant(field)
    }
}

/// Zero-terminated string keys.
///
/// Everything from the first zero byte on is ignored, so `b"ab\0cd"` and
/// `b"ab"` name the same entry. The key field holds at most `key_size - 1`
/// characters plus the terminator.
#[derive(Copy, Clone, Debug, Default)]
pub struct CStrKey;

impl KeyKind for CStrKey {
    const MIN_KEY_SIZE: usize = 2;

    #[inline]
    fn significant(key: &[u8]) -> &[u8] {
        match key.iter().position(|&b| b == 0) {
            Some(end) => &key[..end],
            None => key,
        }
    }

    fn check(key: &[u8], key_size: usize) -> Result<()> {
        let len = Self::significant(key).len();
        let max = key_size.saturating_sub(1);
        if len > max {
            return Err(MapError::KeyTooLong { len, max });
        }
        Ok(())
    }

    fn store(key: &[u8], field: &mut [u8]) {
        let key = Self::significant(key);
        field[..key.len()].copy_from_slice(key);
        field[key.len()..].fill(0);
    }
}

/// Fixed-length binary keys. All `key_size` bytes are significant,
/// including zero bytes.
#[derive(Copy, Clone, Debug, Default)]
pub struct FixedKey;

impl KeyKind for FixedKey {
    const MIN_KEY_SIZE: usize = 1;

    #[inline]
    fn significant(key: &[u8]) -> &[u8] {
        key
    }

    fn check(key: &[u8], key_size: usize) -> Result<()> {
        if key.len() != key_size {
            return Err(MapError::KeySizeMismatch {
                expected: key_size,
                actual: key.len(),
            });
        }
        Ok(())
    }

    fn store(key: &[u8], field: &mut [u8]) {
        field.copy_from_slice(key);
    }
}
