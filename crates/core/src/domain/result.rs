// Processing Summary & Result Artifact

use super::{JobId, ObjectLocation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// (line count, checksum, byte count) from one pass over a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub total_lines: u64,
    /// Lowercase hex SHA-256 of the whole stream
    pub checksum: String,
    pub total_bytes: u64,
}

/// Terminal status written into the result artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Succeeded,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "SUCCEEDED"),
        }
    }
}

/// Result artifact written to the output location (never mutated)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub job_id: JobId,
    pub input_bucket: String,
    pub input_key: String,
    pub output_bucket: String,
    pub output_key: String,
    pub total_lines: u64,
    /// From the metadata probe, not the stream pass
    pub file_size_bytes: u64,
    pub checksum: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub status: JobStatus,
}

impl ProcessingResult {
    pub fn succeeded(
        job_id: JobId,
        input: &ObjectLocation,
        output: &ObjectLocation,
        summary: &ProcessingSummary,
        file_size_bytes: u64,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            input_bucket: input.bucket().to_string(),
            input_key: input.key().to_string(),
            output_bucket: output.bucket().to_string(),
            output_key: output.key().to_string(),
            total_lines: summary.total_lines,
            file_size_bytes,
            checksum: summary.checksum.clone(),
            started_at,
            finished_at,
            processing_time_ms: elapsed_millis(started_at, finished_at),
            status: JobStatus::Succeeded,
        }
    }

    pub fn to_json_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Clock skew can make `finished < started`; clamp to zero
pub fn elapsed_millis(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> u64 {
    (finished_at - started_at).num_milliseconds().max(0) as u64
}
