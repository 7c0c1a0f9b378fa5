// Create Job Use Case - validate an upload and publish a job message

use crate::domain::{DomainError, JobId, JobMessage, ObjectLocation};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobQueue, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// File suffixes accepted for processing (matched case-insensitively)
pub const SUPPORTED_SUFFIXES: &[&str] = &[".csv"];

/// Job Creator (not part of the concurrency-sensitive core)
pub struct CreateJobService {
    queue: Arc<dyn JobQueue>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    output_bucket: String,
}

impl CreateJobService {
    /// # Errors
    /// - AppError::Config if `output_bucket` is blank
    pub fn new(
        queue: Arc<dyn JobQueue>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        output_bucket: impl Into<String>,
    ) -> Result<Self> {
        let output_bucket = output_bucket.into();
        if output_bucket.trim().is_empty() {
            return Err(AppError::Config("output bucket must not be blank".to_string()));
        }
        Ok(Self {
            queue,
            id_provider,
            time_provider,
            output_bucket,
        })
    }

    /// Publish one job for an uploaded object
    ///
    /// # Errors
    /// - Validation error for unsupported file types (never retried)
    /// - Queue errors from publishing
    pub async fn create_job(&self, input: &ObjectLocation) -> Result<JobId> {
        validate_file_type(input.key())?;

        let job_id = self.id_provider.generate_id();
        let output = ObjectLocation::output_for(&self.output_bucket, &job_id)?;
        let created_at = self.time_provider.now();

        let message = JobMessage::new(job_id, input, &output, created_at);
        self.queue.send(&message).await?;

        info!(
            job_id = %job_id,
            input_bucket = input.bucket(),
            input_key = input.key(),
            output_bucket = output.bucket(),
            output_key = output.key(),
            created_at = %created_at.to_rfc3339(),
            "job_created"
        );
        Ok(job_id)
    }

    /// Publish one job per uploaded object (upload event fan-out)
    ///
    /// Stops at the first failure; jobs already published stay published.
    pub async fn create_jobs(&self, inputs: &[ObjectLocation]) -> Result<Vec<JobId>> {
        if inputs.is_empty() {
            warn!("upload_event_empty");
        }
        let mut ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            ids.push(self.create_job(input).await?);
        }
        Ok(ids)
    }
}

/// Accept only recognized file suffixes
pub fn validate_file_type(key: &str) -> std::result::Result<(), DomainError> {
    let normalized = key.to_lowercase();
    if SUPPORTED_SUFFIXES.iter().any(|s| normalized.ends_with(s)) {
        Ok(())
    } else {
        Err(DomainError::UnsupportedFileType(key.to_string()))
    }
}
