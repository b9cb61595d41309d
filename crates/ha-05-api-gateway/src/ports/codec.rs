//! Exchange codec port
//!
//! Keeps the wire encoding of a contagious report out of the handlers, so
//! the router only deals in `ReportBatch` and `IngestReceipt`.

use axum::response::Response;
use ha_03_ingestion::{IngestError, IngestReceipt};
use shared_types::ReportBatch;

use crate::domain::ApiError;

pub trait ExchangeCodec: Send + Sync {
    /// Decode and shape-check a request body.
    fn parse_batch(&self, body: &[u8]) -> Result<ReportBatch, ApiError>;

    /// Render the outcome of an ingestion attempt.
    fn write_response(&self, outcome: Result<IngestReceipt, IngestError>) -> Response;
}
