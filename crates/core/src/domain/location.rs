// Object Location (bucket + key)

use super::error::{require_non_blank, Result};
use super::JobId;
use std::fmt;

/// Prefix under which result artifacts are written
pub const OUTPUT_KEY_PREFIX: &str = "output/";

/// Identifies a stored object; both parts are non-blank
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    bucket: String,
    key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();
        require_non_blank(&bucket, "bucket")?;
        require_non_blank(&key, "key")?;
        Ok(Self { bucket, key })
    }

    /// Deterministic result location for a job: `<bucket>/output/<jobId>.json`
    pub fn output_for(bucket: impl Into<String>, job_id: &JobId) -> Result<Self> {
        Self::new(bucket, output_key_for(job_id))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Output key convention, derived purely from job identity
pub fn output_key_for(job_id: &JobId) -> String {
    format!("{}{}.json", OUTPUT_KEY_PREFIX, job_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_blank_parts_rejected() {
        assert_eq!(
            ObjectLocation::new("", "a.csv").unwrap_err(),
            DomainError::BlankField("bucket")
        );
        assert_eq!(
            ObjectLocation::new("bucket", "   ").unwrap_err(),
            DomainError::BlankField("key")
        );
    }

    #[test]
    fn test_output_key_convention() {
        let id: JobId = "5a2f1d9c-0c55-4c37-8a43-6c1f4b0c2d77".parse().unwrap();
        assert_eq!(
            output_key_for(&id),
            "output/5a2f1d9c-0c55-4c37-8a43-6c1f4b0c2d77.json"
        );

        let location = ObjectLocation::output_for("results", &id).unwrap();
        assert_eq!(location.bucket(), "results");
        assert_eq!(location.key(), output_key_for(&id));
    }
}
