//! # HA-03 Ingestion
//!
//! Write path of the health authority: takes a reporter's batch of
//! (epoch, seed) disclosures, checks it, checks the reporter, and commits it
//! to the epoch seed store as one unit.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | All or Nothing | A batch is fully stored or not stored at all |
//! | 2 | Gate Before Write | Validation and authorization precede any store access |
//! | 3 | Single-Use Credentials | A token is spent only by a successful commit |
//! | 4 | Rebuild After Commit | Every commit asks for a filter covering it |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - `IngestReceipt`, `IngestionConfig`, error taxonomy
//! - `ports/` - `IngestionApi` (inbound), `Authorizer` and `RebuildTrigger` (outbound)
//! - `adapters/` - `HmacTokenAuthorizer`
//! - `service.rs` - `IngestionService`

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{issue_token, HmacTokenAuthorizer};
pub use domain::{AuthError, IngestError, IngestReceipt, IngestionConfig};
pub use metrics::{IngestMetrics, IngestMetricsSnapshot};
pub use ports::{AuthGrant, Authorizer, IngestionApi, RebuildTrigger};
pub use service::IngestionService;
