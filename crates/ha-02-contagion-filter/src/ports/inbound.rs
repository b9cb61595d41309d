//! Inbound Ports (Driving Ports)

/// Request that the filter be rebuilt to cover at least `generation`.
///
/// Never fails from the caller's point of view: ingestion has already
/// committed by the time it asks, so rebuild errors stay on this side.
pub trait RebuildTrigger: Send + Sync {
    fn request_rebuild(&self, generation: u64);
}
