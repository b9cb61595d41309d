//! Outbound Ports (Driven Ports)

use ha_02_contagion_filter::{ArtifactPublisher, FilterArtifact};
use std::sync::Arc;

/// Wherever the current artifact lives.
pub trait ArtifactSource: Send + Sync {
    fn current_artifact(&self) -> Arc<FilterArtifact>;
}

impl ArtifactSource for ArtifactPublisher {
    fn current_artifact(&self) -> Arc<FilterArtifact> {
        self.current()
    }
}
