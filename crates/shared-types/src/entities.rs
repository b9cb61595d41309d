//! # Domain Entities
//!
//! Disclosure records and the batches that carry them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Width of a disclosed seed in bytes.
pub const SEED_LENGTH: usize = 16;

/// Upper bound on records accepted in a single batch.
pub const DEFAULT_MAX_BATCH_RECORDS: usize = 10_000;

/// A discrete time bucket used to rotate ephemeral identifiers.
///
/// Epochs are numbered from the Unix epoch in units of
/// [`EPOCH_LENGTH_SECS`](crate::protocol::EPOCH_LENGTH_SECS).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(pub u32);

impl Epoch {
    /// Epoch from a wire integer, rejecting negative and overflowing values.
    pub fn from_wire(value: i64) -> Result<Self, ValidationError> {
        u32::try_from(value)
            .map(Epoch)
            .map_err(|_| ValidationError::EpochOutOfRange { value })
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secret from which a client derives the ephemeral identifier of one epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seed([u8; SEED_LENGTH]);

impl Seed {
    pub fn new(bytes: [u8; SEED_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build a seed from a byte slice of exactly [`SEED_LENGTH`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let array: [u8; SEED_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| ValidationError::SeedLength {
                    expected: SEED_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Decode a hex encoded seed as sent by reporters.
    pub fn from_hex(text: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(text).map_err(|e| ValidationError::SeedEncoding {
            reason: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", self.to_hex())
    }
}

/// An (epoch, seed) pair voluntarily submitted by a contagious reporter.
///
/// Ordered by epoch, then seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisclosureRecord {
    pub epoch: Epoch,
    pub seed: Seed,
}

impl DisclosureRecord {
    pub fn new(epoch: Epoch, seed: Seed) -> Self {
        Self { epoch, seed }
    }
}

/// Opaque reporter credential.
///
/// The value is never printed; `Debug` only shows its length.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} bytes>)", self.0.len())
    }
}

/// An authorized submission of disclosure records.
///
/// Created by a reporter and consumed exactly once by the ingestion service,
/// which takes it by value.
#[derive(Clone, Debug)]
pub struct ReportBatch {
    pub authorization: Credential,
    pub records: Vec<DisclosureRecord>,
}

impl ReportBatch {
    pub fn new(authorization: Credential, records: Vec<DisclosureRecord>) -> Self {
        Self {
            authorization,
            records,
        }
    }

    /// Check the batch level constraints: non-empty and bounded.
    pub fn validate(&self, max_records: usize) -> Result<(), ValidationError> {
        if self.records.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        if self.records.len() > max_records {
            return Err(ValidationError::TooManyRecords {
                count: self.records.len(),
                max: max_records,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
