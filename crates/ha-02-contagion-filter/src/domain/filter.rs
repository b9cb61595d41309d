//! The membership structure clients download.

use serde::{Deserialize, Serialize};
use shared_types::{ephid_for_seed, filter_key, EphId, Epoch, FilterKey, Seed};
use std::fmt;
use std::str::FromStr;

use super::bloom_filter::BloomFilter;
use super::cuckoo::CuckooFilter;
use crate::error::FilterError;

/// Which membership structure to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Cuckoo,
    Bloom,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Cuckoo => write!(f, "cuckoo"),
            FilterKind::Bloom => write!(f, "bloom"),
        }
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cuckoo" => Ok(FilterKind::Cuckoo),
            "bloom" => Ok(FilterKind::Bloom),
            other => Err(FilterError::InvalidParameters(format!(
                "unknown filter kind '{other}' (expected cuckoo or bloom)"
            ))),
        }
    }
}

/// Encoded filter, tagged with its kind so clients know how to probe it.
///
/// Holds `filter_key(epoch, ephid(seed))` for every disclosed record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContagionFilter {
    Cuckoo(CuckooFilter),
    Bloom(BloomFilter),
}

impl ContagionFilter {
    pub fn kind(&self) -> FilterKind {
        match self {
            ContagionFilter::Cuckoo(_) => FilterKind::Cuckoo,
            ContagionFilter::Bloom(_) => FilterKind::Bloom,
        }
    }

    pub fn contains_key(&self, key: &FilterKey) -> bool {
        match self {
            ContagionFilter::Cuckoo(filter) => filter.contains(key.as_bytes()),
            ContagionFilter::Bloom(filter) => filter.contains(key.as_bytes()),
        }
    }

    /// Whether the record `(epoch, seed)` is (probably) in the filter.
    pub fn contains_record(&self, epoch: Epoch, seed: &Seed) -> bool {
        self.contains_observation(epoch, &ephid_for_seed(seed))
    }

    /// Client-side probe: was `ephid`, heard during `epoch`, disclosed?
    pub fn contains_observation(&self, epoch: Epoch, ephid: &EphId) -> bool {
        self.contains_key(&filter_key(epoch, ephid))
    }

    /// Number of keys inserted.
    pub fn len(&self) -> usize {
        match self {
            ContagionFilter::Cuckoo(filter) => filter.len(),
            ContagionFilter::Bloom(filter) => filter.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn encode(&self) -> Result<Vec<u8>, FilterError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FilterError> {
        let filter: ContagionFilter = bincode::deserialize(bytes)?;
        let well_formed = match &filter {
            ContagionFilter::Cuckoo(f) => f.is_well_formed(),
            ContagionFilter::Bloom(f) => f.is_well_formed(),
        };
        if !well_formed {
            return Err(FilterError::Malformed(format!(
                "{} filter has inconsistent dimensions",
                filter.kind()
            )));
        }
        Ok(filter)
    }
}
