//! # Protocol Constants and Derivations
//!
//! The epoch clock and the derivation of filter keys from disclosed seeds.
//!
//! ```text
//! seed ──SHA-256──> TRUNCATE128 ──> EphID
//!                                     │
//!             EphID ‖ epoch (u32 LE) ─┴─SHA-256──> filter key
//! ```
//!
//! The server inserts `filter_key(epoch, ephid(seed))` for every disclosed
//! record. A client tests `filter_key(epoch, observed_ephid)` for each
//! identifier it heard, so the server never learns which tokens matched.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::entities::{DisclosureRecord, Epoch, Seed};
use crate::errors::ValidationError;

/// API version reported by `GET /version`.
pub const API_VERSION: &str = "1";

/// Length of one epoch (15 minutes).
pub const EPOCH_LENGTH_SECS: i64 = 15 * 60;

/// Width of an ephemeral identifier in bytes.
pub const EPHID_LENGTH: usize = 16;

/// Width of a filter key in bytes.
pub const FILTER_KEY_LENGTH: usize = 32;

/// Short-lived, locally broadcast identifier derived from an epoch's seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EphId(pub [u8; EPHID_LENGTH]);

impl fmt::Debug for EphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EphId({})", hex::encode(self.0))
    }
}

/// Element stored in the contagion filter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterKey(pub [u8; FILTER_KEY_LENGTH]);

impl FilterKey {
    pub fn as_bytes(&self) -> &[u8; FILTER_KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterKey({}..)", hex::encode(&self.0[..8]))
    }
}

/// Epoch containing the given instant.
pub fn epoch_for(instant: DateTime<Utc>) -> Result<Epoch, ValidationError> {
    let secs = instant.timestamp();
    if secs < 0 {
        return Err(ValidationError::TimestampBeforeEpoch { timestamp: secs });
    }
    Epoch::from_wire(secs / EPOCH_LENGTH_SECS)
}

/// First instant of an epoch.
pub fn epoch_start(epoch: Epoch) -> DateTime<Utc> {
    let secs = i64::from(epoch.as_u32()) * EPOCH_LENGTH_SECS;
    // In range for every u32 epoch
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Ephemeral identifier broadcast during the epoch a seed belongs to.
pub fn ephid_for_seed(seed: &Seed) -> EphId {
    let digest = Sha256::digest(seed.as_bytes());
    let mut ephid = [0u8; EPHID_LENGTH];
    ephid.copy_from_slice(&digest[..EPHID_LENGTH]);
    EphId(ephid)
}

/// Filter key for an identifier observed during an epoch.
pub fn filter_key(epoch: Epoch, ephid: &EphId) -> FilterKey {
    let mut hasher = Sha256::new();
    hasher.update(ephid.0);
    hasher.update(epoch.as_u32().to_le_bytes());
    FilterKey(hasher.finalize().into())
}

/// Filter key of a disclosed record.
pub fn record_filter_key(record: &DisclosureRecord) -> FilterKey {
    filter_key(record.epoch, &ephid_for_seed(&record.seed))
}
