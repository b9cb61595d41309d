//! # Cuckoo Filter
//!
//! Space-efficient probabilistic set of filter keys, the structure clients
//! download to test their observed ephemeral identifiers.
//!
//! ## Determinism
//!
//! | Source of variation | Fixed by |
//! |---------------------|----------|
//! | Hash function | SipHash-1-3 with constant keys |
//! | Eviction victim | Kick counter, not a random slot |
//! | Insertion order | Caller feeds records in epoch order |
//!
//! Building twice from the same records therefore yields identical buckets,
//! and so identical encoded bytes.

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Entries per bucket.
pub const ENTRIES_PER_BUCKET: usize = 4;

/// Fingerprint size in bits.
pub const FINGERPRINT_SIZE: usize = 16;

/// Smallest bucket table ever allocated.
pub const MIN_BUCKET_COUNT: usize = 4;

/// Maximum number of kicks before giving up.
const MAX_KICKS: usize = 500;

/// Fixed SipHash keys shared with every client.
const SIP_KEY_0: u64 = 0x6570_6964_6f73_6531;
const SIP_KEY_1: u64 = 0x6375_636b_6f6f_2d31;

/// Fingerprint stored in each slot; 0 marks an empty slot.
pub type Fingerprint = u16;

/// A bucket containing multiple fingerprints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    entries: [Fingerprint; ENTRIES_PER_BUCKET],
}

impl Bucket {
    /// Insert fingerprint if there's an empty slot.
    fn insert(&mut self, fp: Fingerprint) -> bool {
        for entry in &mut self.entries {
            if *entry == 0 {
                *entry = fp;
                return true;
            }
        }
        false
    }

    fn contains(&self, fp: Fingerprint) -> bool {
        self.entries.iter().any(|&e| e == fp)
    }

    /// Replace the fingerprint in `slot`, returning the evicted one.
    fn swap(&mut self, slot: usize, fp: Fingerprint) -> Fingerprint {
        std::mem::replace(&mut self.entries[slot % ENTRIES_PER_BUCKET], fp)
    }
}

/// Cuckoo filter over byte-string keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuckooFilter {
    buckets: Vec<Bucket>,
    count: u64,
}

impl CuckooFilter {
    /// Create an empty filter able to hold roughly `capacity` keys.
    ///
    /// The bucket count is always a power of two so that the alternate
    /// bucket of an alternate bucket is the original one.
    pub fn new(capacity: usize) -> Self {
        Self::with_buckets(capacity.div_ceil(ENTRIES_PER_BUCKET))
    }

    /// Create an empty filter with at least `bucket_count` buckets.
    pub fn with_buckets(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.next_power_of_two().max(MIN_BUCKET_COUNT);
        Self {
            buckets: vec![Bucket::default(); bucket_count],
            count: 0,
        }
    }

    /// Insert a key.
    ///
    /// Returns `false` if the filter is full. A failed insertion may have
    /// displaced another key, so the filter must be discarded afterwards.
    pub fn insert(&mut self, key: &[u8]) -> bool {
        let (fp, i1, i2) = self.indices(key);

        if self.buckets[i1].insert(fp) || self.buckets[i2].insert(fp) {
            self.count += 1;
            return true;
        }

        self.relocate(fp, i1)
    }

    fn relocate(&mut self, mut fp: Fingerprint, mut idx: usize) -> bool {
        for kick in 0..MAX_KICKS {
            fp = self.buckets[idx].swap(kick, fp);
            idx = self.alt_index(idx, fp);

            if self.buckets[idx].insert(fp) {
                self.count += 1;
                return true;
            }
        }
        false
    }

    /// Check if a key might be in the filter.
    pub fn contains(&self, key: &[u8]) -> bool {
        let (fp, i1, i2) = self.indices(key);
        self.buckets[i1].contains(fp) || self.buckets[i2].contains(fp)
    }

    /// Number of keys inserted.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / (self.buckets.len() * ENTRIES_PER_BUCKET) as f64
    }

    /// Structural check for filters decoded from untrusted bytes.
    pub fn is_well_formed(&self) -> bool {
        let slots = self.buckets.len() * ENTRIES_PER_BUCKET;
        self.buckets.len().is_power_of_two() && self.count as usize <= slots
    }

    /// Fingerprint and both candidate buckets of a key.
    fn indices(&self, key: &[u8]) -> (Fingerprint, usize, usize) {
        let hash = sip_hash(key);
        let fp = match (hash >> 48) as Fingerprint {
            0 => 1,
            fp => fp,
        };
        let i1 = (hash as usize) & self.mask();
        let i2 = self.alt_index(i1, fp);
        (fp, i1, i2)
    }

    /// Partial-key cuckoo hashing.
    fn alt_index(&self, idx: usize, fp: Fingerprint) -> usize {
        (idx ^ sip_hash(&fp.to_le_bytes()) as usize) & self.mask()
    }

    fn mask(&self) -> usize {
        self.buckets.len() - 1
    }
}

fn sip_hash(bytes: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(SIP_KEY_0, SIP_KEY_1);
    hasher.write(bytes);
    hasher.finish()
}
