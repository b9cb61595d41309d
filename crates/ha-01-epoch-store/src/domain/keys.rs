//! Key layout of the epoch seed table.
//!
//! ```text
//! seed:<epoch u64 BE><seed bytes>  -> (empty)
//! meta:generation                  -> u64 BE
//! ```
//!
//! The whole record lives in the key, so two reporters disclosing different
//! seeds for the same epoch get two rows, and writing an identical pair again
//! rewrites the same row. Big-endian epochs keep the table ordered by epoch
//! under a byte-wise ordered backend.

use shared_types::{DisclosureRecord, Epoch, Seed, SEED_LENGTH};

use super::errors::StoreError;

/// Prefix of every disclosure row.
pub const SEED_PREFIX: &[u8] = b"seed:";

/// Key of the committed generation counter.
pub const GENERATION_KEY: &[u8] = b"meta:generation";

const EPOCH_WIDTH: usize = 8;

/// Key of the row holding one disclosure record.
pub fn seed_key(record: &DisclosureRecord) -> Vec<u8> {
    let mut key = Vec::with_capacity(SEED_PREFIX.len() + EPOCH_WIDTH + SEED_LENGTH);
    key.extend_from_slice(SEED_PREFIX);
    key.extend_from_slice(&u64::from(record.epoch.as_u32()).to_be_bytes());
    key.extend_from_slice(record.seed.as_bytes());
    key
}

/// Decode a `seed:` row back into its record.
pub fn decode_seed_row(key: &[u8], value: &[u8]) -> Result<DisclosureRecord, StoreError> {
    let malformed = |reason: &str| StoreError::MalformedRow {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: reason.to_string(),
    };

    let raw = key
        .strip_prefix(SEED_PREFIX)
        .ok_or_else(|| malformed("missing seed prefix"))?;
    if raw.len() != EPOCH_WIDTH + SEED_LENGTH {
        return Err(malformed("key is not an epoch followed by a seed"));
    }
    if !value.is_empty() {
        return Err(malformed("unexpected row value"));
    }

    let (epoch_bytes, seed_bytes) = raw.split_at(EPOCH_WIDTH);
    let mut epoch = [0u8; EPOCH_WIDTH];
    epoch.copy_from_slice(epoch_bytes);
    let epoch = u32::try_from(u64::from_be_bytes(epoch))
        .map(Epoch)
        .map_err(|_| malformed("epoch out of range"))?;
    let seed = Seed::from_slice(seed_bytes).map_err(|e| malformed(&e.to_string()))?;

    Ok(DisclosureRecord::new(epoch, seed))
}

pub fn encode_generation(generation: u64) -> Vec<u8> {
    generation.to_be_bytes().to_vec()
}

pub fn decode_generation(value: &[u8]) -> Result<u64, StoreError> {
    let raw: [u8; 8] = value.try_into().map_err(|_| StoreError::MalformedRow {
        key: String::from_utf8_lossy(GENERATION_KEY).into_owned(),
        reason: "generation is not 8 bytes".to_string(),
    })?;
    Ok(u64::from_be_bytes(raw))
}
