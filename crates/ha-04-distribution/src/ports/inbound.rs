//! Inbound Ports (Driving Ports)

use ha_02_contagion_filter::FilterArtifact;
use std::sync::Arc;

/// Read path API used by the transport layer.
///
/// Holds no per-client state; every call reflects the latest publication.
pub trait DistributionApi: Send + Sync {
    /// The most recently published filter. Never fails: before the first
    /// build this is the empty artifact at version 0.
    fn get_filter(&self) -> Arc<FilterArtifact>;

    /// Protocol version string clients check before downloading.
    fn get_api_version(&self) -> &'static str;
}
