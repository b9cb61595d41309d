//! JSON exchange codec, the format reporters' devices speak.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ha_03_ingestion::{IngestError, IngestReceipt};
use shared_types::{ContagiousReport, ReportBatch};

use crate::domain::ApiError;
use crate::ports::ExchangeCodec;

/// Body returned for an accepted batch.
pub const ACCEPTED_BODY: &str = "OK";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ExchangeCodec for JsonCodec {
    fn parse_batch(&self, body: &[u8]) -> Result<ReportBatch, ApiError> {
        let report: ContagiousReport = serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
        Ok(ReportBatch::from_wire(report)?)
    }

    fn write_response(&self, outcome: Result<IngestReceipt, IngestError>) -> Response {
        match outcome {
            Ok(_) => (StatusCode::OK, ACCEPTED_BODY).into_response(),
            Err(e) => ApiError::from(e).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_03_ingestion::AuthError;
    use shared_types::Epoch;

    #[test]
    fn test_parse_batch() {
        let body = format!(
            r#"{{"authorization":"tok","data":[{{"epoch":7,"seed":"{}"}}]}}"#,
            "0f".repeat(16)
        );
        let batch = JsonCodec.parse_batch(body.as_bytes()).unwrap();
        assert_eq!(batch.authorization.as_str(), "tok");
        assert_eq!(batch.records[0].epoch, Epoch(7));
    }

    #[test]
    fn test_parse_errors_are_bad_requests() {
        for body in [
            "not json".to_string(),
            r#"{"data":[]}"#.to_string(),
            r#"{"authorization":"t","data":[{"epoch":-1,"seed":"00"}]}"#.to_string(),
            format!(r#"{{"authorization":"t","data":[{{"epoch":1,"seed":"{}"}}]}}"#, "zz".repeat(16)),
        ] {
            assert!(
                matches!(JsonCodec.parse_batch(body.as_bytes()), Err(ApiError::BadRequest(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_write_response_status() {
        let ok = JsonCodec.write_response(Ok(IngestReceipt {
            records: 1,
            generation: 1,
        }));
        assert_eq!(ok.status(), StatusCode::OK);

        let denied = JsonCodec.write_response(Err(AuthError::Missing.into()));
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    }
}
