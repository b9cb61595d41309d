//! Wire format of `POST /add_contagious`.
//!
//! ```json
//! {"authorization": "<credential>", "data": [{"epoch": 100, "seed": "aa.."}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::entities::{Credential, DisclosureRecord, Epoch, ReportBatch, Seed};
use crate::errors::ValidationError;

/// One record as sent by a reporter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub epoch: i64,
    pub seed: String,
}

/// Request body of a contagious report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContagiousReport {
    pub authorization: String,
    pub data: Vec<WireRecord>,
}

impl WireRecord {
    pub fn new(epoch: i64, seed: impl Into<String>) -> Self {
        Self {
            epoch,
            seed: seed.into(),
        }
    }

    fn to_record(&self) -> Result<DisclosureRecord, ValidationError> {
        let epoch = Epoch::from_wire(self.epoch)?;
        let seed = Seed::from_hex(&self.seed)?;
        Ok(DisclosureRecord::new(epoch, seed))
    }
}

impl ReportBatch {
    /// Build a typed batch, validating every record's shape.
    ///
    /// The first malformed record rejects the whole batch.
    pub fn from_wire(report: ContagiousReport) -> Result<Self, ValidationError> {
        let records = report
            .data
            .iter()
            .enumerate()
            .map(|(index, record)| record.to_record().map_err(|e| e.at_record(index)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReportBatch::new(Credential::new(report.authorization), records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_body() {
        let body = format!(
            r#"{{"authorization":"token","data":[{{"epoch":100,"seed":"{}"}},{{"epoch":101,"seed":"{}"}}]}}"#,
            "aa".repeat(16),
            "bb".repeat(16)
        );
        let report: ContagiousReport = serde_json::from_str(&body).unwrap();
        let batch = ReportBatch::from_wire(report).unwrap();

        assert_eq!(batch.authorization.as_str(), "token");
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].epoch, Epoch(100));
        assert_eq!(batch.records[1].seed.to_hex(), "bb".repeat(16));
    }

    #[test]
    fn test_bad_record_rejects_batch() {
        let report = ContagiousReport {
            authorization: "token".into(),
            data: vec![
                WireRecord::new(100, "aa".repeat(16)),
                WireRecord::new(101, "not-hex"),
            ],
        };

        let err = ReportBatch::from_wire(report).unwrap_err();
        match err {
            ValidationError::Record { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, ValidationError::SeedEncoding { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_negative_epoch_rejected() {
        let report = ContagiousReport {
            authorization: "token".into(),
            data: vec![WireRecord::new(-5, "aa".repeat(16))],
        };
        assert!(ReportBatch::from_wire(report).is_err());
    }
}
