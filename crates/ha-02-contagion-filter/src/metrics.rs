//! Metrics for filter rebuilds and publication
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = FilterMetrics::new();
//! let start = std::time::Instant::now();
//! // ... rebuild ...
//! metrics.record_rebuild(start.elapsed());
//! let snapshot = metrics.snapshot();
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Thread-safe counters and gauges for the filter pipeline.
#[derive(Default)]
pub struct FilterMetrics {
    /// Rebuilds that produced a publishable artifact
    pub rebuilds_succeeded: AtomicU64,
    /// Rebuilds that failed (snapshot, build, encode or persist)
    pub rebuilds_failed: AtomicU64,
    /// Builds discarded because a newer generation was already published
    pub stale_builds_discarded: AtomicU64,
    /// Duration of the most recent successful rebuild in microseconds
    pub last_build_micros: AtomicU64,
    /// Version of the currently served artifact
    pub published_version: AtomicU64,
    /// Record count of the currently served artifact
    pub published_records: AtomicU64,
}

/// Point-in-time copy of [`FilterMetrics`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterMetricsSnapshot {
    pub rebuilds_succeeded: u64,
    pub rebuilds_failed: u64,
    pub stale_builds_discarded: u64,
    pub last_build_micros: u64,
    pub published_version: u64,
    pub published_records: u64,
}

impl FilterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rebuild(&self, duration: Duration) {
        self.rebuilds_succeeded.fetch_add(1, Ordering::Relaxed);
        self.last_build_micros
            .store(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.rebuilds_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale_builds_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self, version: u64, records: u64) {
        self.published_version.store(version, Ordering::Relaxed);
        self.published_records.store(records, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FilterMetricsSnapshot {
        FilterMetricsSnapshot {
            rebuilds_succeeded: self.rebuilds_succeeded.load(Ordering::Relaxed),
            rebuilds_failed: self.rebuilds_failed.load(Ordering::Relaxed),
            stale_builds_discarded: self.stale_builds_discarded.load(Ordering::Relaxed),
            last_build_micros: self.last_build_micros.load(Ordering::Relaxed),
            published_version: self.published_version.load(Ordering::Relaxed),
            published_records: self.published_records.load(Ordering::Relaxed),
        }
    }
}
