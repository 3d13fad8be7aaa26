//! Key hashing: reflected CRC-32 folded down to 16 bits.
//!
//! The stored per-slot hash is `crc32(bytes) % 0xFFFF`, so it always fits a
//! `u16` and never takes the value `0xFFFF`. The bucket of a key is that
//! value modulo the bucket count.

const POLY: u32 = 0xEDB8_8320;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Standard CRC-32 (IEEE, reflected) of `bytes`.
#[inline]
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        crc = (crc >> 8) ^ TABLE[((crc ^ b as u32) & 0xFF) as usize];
    }
    !crc
}

/// 16-bit hash stored in every slot and used to pick a bucket.
#[inline]
pub fn key_hash(significant: &[u8]) -> u16 {
    (crc32(significant) % 0xFFFF) as u16
}

/// Bucket id for a precomputed key hash.
#[inline]
pub(crate) fn bucket_for(hash: u16, buckets: usize) -> usize {
    hash as usize % buckets
}
