// Job Message - wire contract between job creator and job processor

use super::error::{require_non_blank, Result};
use super::{IdempotencyKey, JobId, ObjectLocation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable, serializable description of one unit of work
///
/// `checksum` is absent until the file has been summarized at least once and is
/// omitted from the JSON form rather than written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    pub job_id: JobId,
    pub input_bucket: String,
    pub input_key: String,
    pub output_bucket: String,
    pub output_key: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl JobMessage {
    pub fn new(
        job_id: JobId,
        input: &ObjectLocation,
        output: &ObjectLocation,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            input_bucket: input.bucket().to_string(),
            input_key: input.key().to_string(),
            output_bucket: output.bucket().to_string(),
            output_key: output.key().to_string(),
            created_at,
            checksum: None,
        }
    }

    /// Check the non-blank invariants (serde alone accepts empty strings)
    pub fn validate(&self) -> Result<()> {
        require_non_blank(&self.input_bucket, "inputBucket")?;
        require_non_blank(&self.input_key, "inputKey")?;
        require_non_blank(&self.output_bucket, "outputBucket")?;
        require_non_blank(&self.output_key, "outputKey")?;
        Ok(())
    }

    /// Parse and validate a message body
    pub fn from_json(body: &str) -> crate::Result<Self> {
        let message: JobMessage = serde_json::from_str(body)
            .map_err(|e| crate::AppError::Validation(format!("Malformed job message: {}", e)))?;
        message.validate()?;
        Ok(message)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn input_location(&self) -> Result<ObjectLocation> {
        ObjectLocation::new(&self.input_bucket, &self.input_key)
    }

    pub fn output_location(&self) -> Result<ObjectLocation> {
        ObjectLocation::new(&self.output_bucket, &self.output_key)
    }

    pub fn idempotency_key(&self) -> IdempotencyKey {
        IdempotencyKey::new(self.job_id, self.checksum.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;
    use chrono::TimeZone;

    fn sample() -> JobMessage {
        let input = ObjectLocation::new("uploads", "2024/data.csv").unwrap();
        let job_id: JobId = "3f1e2d4c-5b6a-4978-8a9b-0c1d2e3f4a5b".parse().unwrap();
        let output = ObjectLocation::output_for("results", &job_id).unwrap();
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        JobMessage::new(job_id, &input, &output, created_at)
    }

    #[test]
    fn test_json_round_trip_without_checksum() {
        let message = sample();
        let json = message.to_json().unwrap();

        assert!(!json.contains("checksum"), "absent checksum must be omitted: {json}");
        assert!(json.contains("\"jobId\":\"3f1e2d4c-5b6a-4978-8a9b-0c1d2e3f4a5b\""));
        assert!(json.contains("\"createdAt\":\"2024-05-01T12:30:00Z\""));

        let parsed = JobMessage::from_json(&json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_json_round_trip_with_checksum() {
        let mut message = sample();
        message.checksum = Some("ab".repeat(32));

        let parsed = JobMessage::from_json(&message.to_json().unwrap()).unwrap();
        assert_eq!(parsed, message);
        assert_eq!(parsed.checksum.as_deref(), Some("ab".repeat(32).as_str()));
    }

    #[test]
    fn test_parses_external_wire_format() {
        let body = r#"{
            "outputKey": "output/3f1e2d4c-5b6a-4978-8a9b-0c1d2e3f4a5b.json",
            "jobId": "3f1e2d4c-5b6a-4978-8a9b-0c1d2e3f4a5b",
            "inputBucket": "uploads",
            "inputKey": "2024/data.csv",
            "outputBucket": "results",
            "createdAt": "2024-05-01T12:30:00.000Z"
        }"#;
        assert_eq!(JobMessage::from_json(body).unwrap(), sample());
    }

    #[test]
    fn test_blank_field_rejected() {
        let mut message = sample();
        message.input_key = " ".to_string();
        let err = JobMessage::from_json(&message.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Domain(_)));
        assert!(err.to_string().contains("inputKey"));
    }

    #[test]
    fn test_malformed_job_id_rejected() {
        let body = r#"{"jobId":"nope","inputBucket":"a","inputKey":"b.csv",
            "outputBucket":"c","outputKey":"d","createdAt":"2024-05-01T12:30:00Z"}"#;
        let err = JobMessage::from_json(body).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_created_at_rejected() {
        let body = r#"{"jobId":"3f1e2d4c-5b6a-4978-8a9b-0c1d2e3f4a5b","inputBucket":"a",
            "inputKey":"b.csv","outputBucket":"c","outputKey":"d"}"#;
        assert!(JobMessage::from_json(body).is_err());
    }
}
