//! Error taxonomy for map construction and mutation.
//!
//! Absence is never an error: lookups and iteration return `None`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("arena allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },

    #[error("no free slot left (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("key of {len} bytes exceeds the maximum of {max}")]
    KeyTooLong { len: usize, max: usize },

    #[error("key must be exactly {expected} bytes, got {actual}")]
    KeySizeMismatch { expected: usize, actual: usize },

    #[error("value must be exactly {expected} bytes, got {actual}")]
    ValueSizeMismatch { expected: usize, actual: usize },

    #[error("invalid map configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MapError>;
