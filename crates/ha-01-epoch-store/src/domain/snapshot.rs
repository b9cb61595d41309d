//! Point-in-time view of the store.

use shared_types::{DisclosureRecord, Epoch, Seed, SEED_LENGTH};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Immutable table contents as of one commit: the set of disclosed pairs.
pub(crate) type Table = BTreeSet<DisclosureRecord>;

/// Snapshot of every disclosure record at a given generation.
///
/// Cheap to clone and restartable: each call to [`iter`](Self::iter) walks
/// the same records in epoch order. Commits made after the snapshot was
/// taken never show up in it.
#[derive(Clone, Debug, Default)]
pub struct RecordSnapshot {
    table: Arc<Table>,
    generation: u64,
}

impl RecordSnapshot {
    pub(crate) fn new(table: Arc<Table>, generation: u64) -> Self {
        Self { table, generation }
    }

    pub(crate) fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Build a snapshot from loose records; repeated pairs collapse.
    pub fn from_records(
        records: impl IntoIterator<Item = DisclosureRecord>,
        generation: u64,
    ) -> Self {
        Self::new(Arc::new(records.into_iter().collect()), generation)
    }

    /// Lazily iterate the records in (epoch, seed) order.
    pub fn iter(&self) -> impl Iterator<Item = DisclosureRecord> + '_ {
        self.table.iter().copied()
    }

    /// Generation of the commit this snapshot reflects (0 = empty store).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Every seed disclosed for `epoch`, in byte order.
    pub fn seeds_for(&self, epoch: Epoch) -> impl Iterator<Item = Seed> + '_ {
        let low = DisclosureRecord::new(epoch, Seed::new([0x00; SEED_LENGTH]));
        let high = DisclosureRecord::new(epoch, Seed::new([0xff; SEED_LENGTH]));
        self.table.range(low..=high).map(|record| record.seed)
    }

    pub fn contains(&self, record: &DisclosureRecord) -> bool {
        self.table.contains(record)
    }
}
