use crate::adapters::storage::InMemoryKVStore;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use shared_types::{DisclosureRecord, Epoch, Seed, SEED_LENGTH};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Record whose seed bytes are all `byte`.
pub fn make_test_record(epoch: u32, byte: u8) -> DisclosureRecord {
    DisclosureRecord::new(Epoch(epoch), Seed::new([byte; SEED_LENGTH]))
}

/// Shared switch controlling a [`FaultyKVStore`].
#[derive(Clone, Default)]
pub struct FaultInjector {
    fail_writes: Arc<AtomicBool>,
    failed_writes: Arc<AtomicU64>,
}

impl FaultInjector {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of batch writes rejected so far.
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::SeqCst)
    }
}

/// In-memory store whose batch writes can be made to fail on demand.
#[derive(Default)]
pub struct FaultyKVStore {
    inner: InMemoryKVStore,
    injector: FaultInjector,
}

impl FaultyKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn injector(&self) -> FaultInjector {
        self.injector.clone()
    }
}

impl KeyValueStore for FaultyKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner.get(key)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        if self.injector.fail_writes.load(Ordering::SeqCst) {
            self.injector.failed_writes.fetch_add(1, Ordering::SeqCst);
            return Err(KVStoreError::IOError {
                message: "injected write failure".to_string(),
            });
        }
        self.inner.atomic_batch_write(operations)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.inner.prefix_scan(prefix)
    }
}
