//! Distribution service

use ha_02_contagion_filter::{ArtifactMeta, FilterArtifact};
use serde::Serialize;
use shared_types::API_VERSION;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::ports::{ArtifactSource, DistributionApi};

#[derive(Default)]
pub struct DistributionMetrics {
    pub filter_downloads: AtomicU64,
    pub bytes_served: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DistributionMetricsSnapshot {
    pub filter_downloads: u64,
    pub bytes_served: u64,
}

impl DistributionMetrics {
    pub fn record_download(&self, bytes: usize) {
        self.filter_downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DistributionMetricsSnapshot {
        DistributionMetricsSnapshot {
            filter_downloads: self.filter_downloads.load(Ordering::Relaxed),
            bytes_served: self.bytes_served.load(Ordering::Relaxed),
        }
    }
}

pub struct DistributionService {
    source: Arc<dyn ArtifactSource>,
    metrics: DistributionMetrics,
}

impl DistributionService {
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            source,
            metrics: DistributionMetrics::default(),
        }
    }

    /// Facts about the served artifact, without counting a download.
    pub fn current_meta(&self) -> ArtifactMeta {
        self.source.current_artifact().meta()
    }

    pub fn metrics(&self) -> DistributionMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl DistributionApi for DistributionService {
    fn get_filter(&self) -> Arc<FilterArtifact> {
        let artifact = self.source.current_artifact();
        self.metrics.record_download(artifact.len());
        trace!(version = artifact.version, "[ha-04] Serving filter");
        artifact
    }

    fn get_api_version(&self) -> &'static str {
        API_VERSION
    }
}
