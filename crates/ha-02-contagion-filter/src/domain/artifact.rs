//! Versioned, published filter artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::cuckoo::CuckooFilter;
use super::filter::{ContagionFilter, FilterKind};
use crate::error::FilterError;

/// Serialised filter plus the facts clients and operators need about it.
///
/// Immutable once published; readers share it through an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterArtifact {
    /// Publication counter, +1 per publish (0 = nothing built yet).
    pub version: u64,
    /// Store generation the filter was built from.
    pub generation: u64,
    pub record_count: u64,
    /// Hex SHA-256 of `bytes`.
    pub digest: String,
    /// Hex SHA-256 of the records the filter was built from (empty if unknown).
    pub source_digest: String,
    pub built_at: DateTime<Utc>,
    pub kind: FilterKind,
    pub bytes: Vec<u8>,
}

/// Everything but the bytes; persisted as the filter file's JSON sidecar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub version: u64,
    pub generation: u64,
    pub record_count: u64,
    pub digest: String,
    /// Absent from sidecars written before it was recorded.
    #[serde(default)]
    pub source_digest: String,
    pub built_at: DateTime<Utc>,
    pub kind: FilterKind,
    pub size_bytes: u64,
}

impl FilterArtifact {
    /// Unpublished artifact (version 0) for encoded filter `bytes`.
    pub fn new(bytes: Vec<u8>, generation: u64, record_count: u64, kind: FilterKind) -> Self {
        Self {
            version: 0,
            generation,
            record_count,
            digest: digest_of(&bytes),
            source_digest: String::new(),
            built_at: Utc::now(),
            kind,
            bytes,
        }
    }

    /// What is served before the first build: an encoded empty cuckoo filter.
    pub fn empty() -> Self {
        let bytes = ContagionFilter::Cuckoo(CuckooFilter::new(0))
            .encode()
            .unwrap_or_default();
        Self {
            version: 0,
            generation: 0,
            record_count: 0,
            digest: digest_of(&bytes),
            source_digest: String::new(),
            built_at: DateTime::<Utc>::UNIX_EPOCH,
            kind: FilterKind::Cuckoo,
            bytes,
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn with_source_digest(mut self, source_digest: String) -> Self {
        self.source_digest = source_digest;
        self
    }

    pub fn decode_filter(&self) -> Result<ContagionFilter, FilterError> {
        ContagionFilter::decode(&self.bytes)
    }

    pub fn meta(&self) -> ArtifactMeta {
        ArtifactMeta {
            version: self.version,
            generation: self.generation,
            record_count: self.record_count,
            digest: self.digest.clone(),
            source_digest: self.source_digest.clone(),
            built_at: self.built_at,
            kind: self.kind,
            size_bytes: self.bytes.len() as u64,
        }
    }

    /// Reassemble an artifact from persisted parts, checking the digest.
    pub fn from_parts(meta: ArtifactMeta, bytes: Vec<u8>) -> Result<Self, String> {
        let digest = digest_of(&bytes);
        if digest != meta.digest {
            return Err(format!(
                "digest {} does not match recorded {}",
                digest, meta.digest
            ));
        }
        Ok(Self {
            version: meta.version,
            generation: meta.generation,
            record_count: meta.record_count,
            digest,
            source_digest: meta.source_digest,
            built_at: meta.built_at,
            kind: meta.kind,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn digest_of(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
