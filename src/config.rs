//! Map geometry: key/value widths, slot count and bucket count limits.

use crate::error::{MapError, Result};
use crate::key::KeyKind;
use crate::slot::SlotLayout;

/// Key field width used by string-keyed dictionaries.
pub const DICT_KEY_SIZE: usize = 32;

/// Bucket count used when none is given.
pub const DEFAULT_BUCKETS: usize = 8;

/// Largest slot count a signed 16-bit link can address.
pub const MAX_CAPACITY: usize = i16::MAX as usize;

/// Largest bucket count whose tail marker `-(b + 2)` still fits in an `i16`.
pub const MAX_BUCKETS: usize = i16::MAX as usize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MapConfig {
    pub key_size: usize,
    pub value_size: usize,
    pub capacity: usize,
}

impl MapConfig {
    /// Zero-capacity configuration; pick a slot count with `with_capacity`.
    pub const fn new(key_size: usize, value_size: usize) -> Self {
        Self {
            key_size,
            value_size,
            capacity: 0,
        }
    }

    /// Configuration for a string-keyed dictionary.
    pub const fn dictionary(value_size: usize) -> Self {
        Self::new(DICT_KEY_SIZE, value_size)
    }

    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub(crate) const fn layout(&self) -> SlotLayout {
        SlotLayout::new(self.key_size, self.value_size)
    }

    /// Number of arena bytes this configuration needs.
    pub fn arena_bytes(&self) -> Option<usize> {
        self.capacity.checked_mul(self.layout().checked_stride()?)
    }

    pub fn validate<K: KeyKind, const B: usize>(&self) -> Result<()> {
        if B == 0 || B > MAX_BUCKETS {
            return Err(MapError::InvalidConfig(format!(
                "bucket count {} outside 1..={}",
                B, MAX_BUCKETS
            )));
        }
        if self.key_size < K::MIN_KEY_SIZE {
            return Err(MapError::InvalidConfig(format!(
                "key size {} below minimum {}",
                self.key_size,
                K::MIN_KEY_SIZE
            )));
        }
        if self.capacity > MAX_CAPACITY {
            return Err(MapError::InvalidConfig(format!(
                "capacity {} exceeds maximum {}",
                self.capacity, MAX_CAPACITY
            )));
        }
        if self.arena_bytes().is_none() {
            return Err(MapError::InvalidConfig("arena size overflows usize".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{CStrKey, FixedKey};

    /// Invariant: stride is header + key + value and drives the arena size.
    #[test]
    fn arena_size() {
        let cfg = MapConfig::new(8, 4).with_capacity(8);
        assert_eq!(cfg.layout().stride(), 16);
        assert_eq!(cfg.arena_bytes(), Some(128));
        assert_eq!(MapConfig::dictionary(4).key_size, DICT_KEY_SIZE);
    }

    /// Invariant: configurations that cannot be encoded in 16-bit links are rejected.
    #[test]
    fn validation() {
        assert!(MapConfig::new(8, 4)
            .with_capacity(MAX_CAPACITY)
            .validate::<CStrKey, DEFAULT_BUCKETS>()
            .is_ok());
        assert!(MapConfig::new(8, 4)
            .with_capacity(MAX_CAPACITY + 1)
            .validate::<CStrKey, DEFAULT_BUCKETS>()
            .is_err());
        assert!(MapConfig::new(1, 4)
            .validate::<CStrKey, DEFAULT_BUCKETS>()
            .is_err());
        assert!(MapConfig::new(1, 4)
            .validate::<FixedKey, DEFAULT_BUCKETS>()
            .is_ok());
        assert!(MapConfig::new(8, 0).validate::<FixedKey, 0>().is_err());
        assert!(MapConfig::new(8, 0).validate::<FixedKey, MAX_BUCKETS>().is_ok());
        assert!(MapConfig::new(8, 0)
            .validate::<FixedKey, { MAX_BUCKETS + 1 }>()
            .is_err());
    }
}
