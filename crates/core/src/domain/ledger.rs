// Idempotency Ledger Model

use super::{JobId, ObjectLocation};
use std::fmt;

/// Job identity optionally paired with a content checksum
///
/// Ledger rows are keyed by `job_id` alone; the checksum only refines
/// completion matching (see `IdempotencyCoordinator::is_completed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey {
    job_id: JobId,
    checksum: Option<String>,
}

impl IdempotencyKey {
    /// Blank checksums are normalized to absent
    pub fn new(job_id: JobId, checksum: Option<String>) -> Self {
        let checksum = checksum.filter(|c| !c.trim().is_empty());
        Self { job_id, checksum }
    }

    pub fn for_job(job_id: JobId) -> Self {
        Self::new(job_id, None)
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Same identity, now carrying the computed checksum
    pub fn with_checksum(&self, checksum: impl Into<String>) -> Self {
        Self::new(self.job_id, Some(checksum.into()))
    }

    /// Canonical form: `jobId` or `jobId:checksum`
    pub fn as_key_string(&self) -> String {
        match &self.checksum {
            Some(checksum) => format!("{}:{}", self.job_id, checksum),
            None => self.job_id.to_string(),
        }
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key_string())
    }
}

/// Ledger entry state for one job identity
///
/// `Absent -> InProgress -> Completed`; `Completed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerStatus {
    Absent,
    InProgress {
        checksum: Option<String>,
    },
    Completed {
        checksum: String,
        output: ObjectLocation,
    },
}

impl LedgerStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, LedgerStatus::Completed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            LedgerStatus::Absent => "ABSENT",
            LedgerStatus::InProgress { .. } => "IN_PROGRESS",
            LedgerStatus::Completed { .. } => "COMPLETED",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_id() -> JobId {
        "9d3b7c1a-2e4f-4a6b-8c0d-1e2f3a4b5c6d".parse().unwrap()
    }

    #[test]
    fn test_key_string_without_checksum() {
        let key = IdempotencyKey::for_job(job_id());
        assert_eq!(key.as_key_string(), "9d3b7c1a-2e4f-4a6b-8c0d-1e2f3a4b5c6d");
    }

    #[test]
    fn test_blank_checksum_treated_as_absent() {
        let key = IdempotencyKey::new(job_id(), Some("  ".to_string()));
        assert_eq!(key.checksum(), None);
        assert_eq!(key.as_key_string(), job_id().to_string());
    }

    #[test]
    fn test_key_string_with_checksum() {
        let key = IdempotencyKey::for_job(job_id()).with_checksum("abc123");
        assert_eq!(
            key.as_key_string(),
            "9d3b7c1a-2e4f-4a6b-8c0d-1e2f3a4b5c6d:abc123"
        );
        assert_eq!(key.job_id(), &job_id());
    }
}
