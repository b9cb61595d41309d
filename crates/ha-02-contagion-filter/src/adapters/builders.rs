//! Membership builder implementations.

use ha_01_epoch_store::RecordSnapshot;
use shared_types::{record_filter_key, FilterKey};
use std::sync::Arc;
use tracing::debug;

use crate::domain::cuckoo::{ENTRIES_PER_BUCKET, MIN_BUCKET_COUNT};
use crate::domain::{BloomFilter, ContagionFilter, CuckooFilter, FilterConfig, FilterKind};
use crate::error::FilterError;
use crate::ports::MembershipBuilder;

/// Builder selected by `config.kind`.
pub fn builder_for(config: &FilterConfig) -> Arc<dyn MembershipBuilder> {
    match config.kind {
        FilterKind::Cuckoo => Arc::new(CuckooBuilder::new(config)),
        FilterKind::Bloom => Arc::new(BloomBuilder::new(config)),
    }
}

fn filter_keys(snapshot: &RecordSnapshot) -> Vec<FilterKey> {
    snapshot.iter().map(|record| record_filter_key(&record)).collect()
}

/// Cuckoo filter builder (the default).
///
/// Sizes the table for the record count plus headroom and doubles it until
/// every key fits.
pub struct CuckooBuilder {
    headroom_percent: usize,
    max_buckets: usize,
}

impl CuckooBuilder {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            headroom_percent: config.cuckoo_headroom_percent,
            max_buckets: config.cuckoo_max_buckets,
        }
    }
}

impl Default for CuckooBuilder {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

impl MembershipBuilder for CuckooBuilder {
    fn kind(&self) -> FilterKind {
        FilterKind::Cuckoo
    }

    fn build(&self, snapshot: &RecordSnapshot) -> Result<ContagionFilter, FilterError> {
        let keys = filter_keys(snapshot);
        let capacity = keys.len() + keys.len() * self.headroom_percent / 100;
        let mut buckets = capacity
            .div_ceil(ENTRIES_PER_BUCKET)
            .next_power_of_two()
            .max(MIN_BUCKET_COUNT);

        while buckets <= self.max_buckets {
            let mut filter = CuckooFilter::with_buckets(buckets);
            if keys.iter().all(|key| filter.insert(key.as_bytes())) {
                return Ok(ContagionFilter::Cuckoo(filter));
            }
            debug!(
                records = keys.len(),
                buckets, "[ha-02] Cuckoo filter full, doubling bucket count"
            );
            buckets *= 2;
        }

        Err(FilterError::CapacityExhausted {
            records: keys.len(),
            max_buckets: self.max_buckets,
        })
    }
}

/// Bloom filter builder sized for a target false positive rate.
pub struct BloomBuilder {
    target_fpr: f64,
}

impl BloomBuilder {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            target_fpr: config.target_fpr,
        }
    }
}

impl MembershipBuilder for BloomBuilder {
    fn kind(&self) -> FilterKind {
        FilterKind::Bloom
    }

    fn build(&self, snapshot: &RecordSnapshot) -> Result<ContagionFilter, FilterError> {
        let keys = filter_keys(snapshot);
        let mut filter = BloomFilter::new_with_fpr(keys.len(), self.target_fpr);
        for key in &keys {
            filter.insert(key.as_bytes());
        }
        Ok(ContagionFilter::Bloom(filter))
    }
}
