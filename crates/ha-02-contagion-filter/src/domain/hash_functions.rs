//! Hash functions for the Bloom filter
//!
//! Uses MurmurHash3 for fast, high-quality hashing with different seeds.

use std::io::Cursor;

/// Hash a key with MurmurHash3 (x64, 128-bit) under `seed`, keeping the
/// lower 64 bits.
pub fn murmur_hash(key: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(key);
    // Reading from an in-memory cursor cannot fail
    murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0) as u64
}

/// Compute k bit positions for a key
///
/// Uses double hashing: h(i) = h1 + i * h2
pub fn compute_hash_positions(key: &[u8], k: usize, m: usize) -> Vec<usize> {
    let h1 = murmur_hash(key, 0);
    let h2 = murmur_hash(key, 1);

    (0..k)
        .map(|i| {
            let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
            (hash % m as u64) as usize
        })
        .collect()
}
