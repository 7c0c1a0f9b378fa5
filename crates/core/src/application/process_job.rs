// Process Job Use Case - one job message in, one result artifact out

use crate::application::idempotency::IdempotencyCoordinator;
use crate::application::summarizer::summarize;
use crate::domain::{IdempotencyKey, JobId, JobMessage, ObjectLocation, ProcessingResult};
use crate::error::Result;
use crate::port::metrics::{JOBS_PROCESSED, JOB_PROCESSING_TIME_MS};
use crate::port::{IdempotencyStore, Metrics, ObjectStorage, TimeProvider, CONTENT_TYPE_JSON};
use std::sync::Arc;
use tracing::{error, info};

/// Logging context threaded through one processing attempt
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: JobId,
    pub input_key: String,
}

impl JobContext {
    pub fn from_message(message: &JobMessage) -> Self {
        Self {
            job_id: message.job_id,
            input_key: message.input_key.clone(),
        }
    }
}

/// Terminal outcome of a processing attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Ledger already `Completed` for this key; nothing done
    Skipped,
    /// Another worker holds the lock; nothing done
    LockDenied,
    /// This call produced and persisted the result
    Succeeded(ProcessingResult),
}

impl ProcessOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessOutcome::Skipped => "SKIPPED",
            ProcessOutcome::LockDenied => "LOCK_DENIED",
            ProcessOutcome::Succeeded(_) => "SUCCEEDED",
        }
    }
}

/// Job Processor
///
/// Per message: check completion, acquire the ledger lock, summarize the input
/// object, write the result, then mark the ledger completed. A failure leaves
/// the ledger entry `InProgress` and is returned to the caller for redelivery.
pub struct ProcessJobService {
    storage: Arc<dyn ObjectStorage>,
    coordinator: IdempotencyCoordinator,
    metrics: Arc<dyn Metrics>,
    time_provider: Arc<dyn TimeProvider>,
    exclude_header: bool,
}

impl ProcessJobService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        ledger: Arc<dyn IdempotencyStore>,
        metrics: Arc<dyn Metrics>,
        time_provider: Arc<dyn TimeProvider>,
        exclude_header: bool,
    ) -> Self {
        Self {
            storage,
            coordinator: IdempotencyCoordinator::new(ledger),
            metrics,
            time_provider,
            exclude_header,
        }
    }

    /// Process one job message
    ///
    /// Skip and lock-denied are successful outcomes, not errors.
    ///
    /// # Errors
    /// - Validation errors for malformed messages (no metrics emitted)
    /// - Storage / ledger / IO errors from the run; counted as failures
    pub async fn process(&self, message: &JobMessage) -> Result<ProcessOutcome> {
        message.validate()?;
        let input = message.input_location()?;
        let output = message.output_location()?;
        let key = message.idempotency_key();
        let ctx = JobContext::from_message(message);

        match self.run(&ctx, &key, &input, &output).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.metrics
                    .increment_counter(JOBS_PROCESSED, &[("status", "failure")]);
                error!(
                    job_id = %ctx.job_id,
                    input_key = %ctx.input_key,
                    error_kind = e.kind(),
                    error = %e,
                    "job_processing_failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        ctx: &JobContext,
        key: &IdempotencyKey,
        input: &ObjectLocation,
        output: &ObjectLocation,
    ) -> Result<ProcessOutcome> {
        if self.coordinator.is_completed(key).await? {
            info!(
                job_id = %ctx.job_id,
                input_key = %ctx.input_key,
                input_bucket = input.bucket(),
                output = %output,
                "job_already_completed"
            );
            return Ok(ProcessOutcome::Skipped);
        }

        if !self.coordinator.try_acquire(key).await? {
            info!(
                job_id = %ctx.job_id,
                input_key = %ctx.input_key,
                input_bucket = input.bucket(),
                "job_already_in_progress"
            );
            return Ok(ProcessOutcome::LockDenied);
        }

        let result = self.execute(ctx, key, input, output).await?;

        let tags = [("status", "success")];
        self.metrics.increment_counter(JOBS_PROCESSED, &tags);
        self.metrics
            .record_timing(JOB_PROCESSING_TIME_MS, result.processing_time_ms, &tags);

        info!(
            job_id = %ctx.job_id,
            input_key = %ctx.input_key,
            total_lines = result.total_lines,
            file_size_bytes = result.file_size_bytes,
            checksum = %result.checksum,
            processing_time_ms = result.processing_time_ms,
            output = %output,
            "job_processed"
        );

        Ok(ProcessOutcome::Succeeded(result))
    }

    /// RUNNING: runs only while holding the ledger lock
    async fn execute(
        &self,
        ctx: &JobContext,
        key: &IdempotencyKey,
        input: &ObjectLocation,
        output: &ObjectLocation,
    ) -> Result<ProcessingResult> {
        let started_at = self.time_provider.now();
        let metadata = self.storage.head(input).await?;

        // Stream is moved into the summarizer and dropped before any error propagates
        let stream = self.storage.get(input).await?;
        let summary = summarize(stream, self.exclude_header).await?;

        let finished_at = self.time_provider.now();

        let result = ProcessingResult::succeeded(
            ctx.job_id,
            input,
            output,
            &summary,
            metadata.size_bytes,
            started_at,
            finished_at,
        );

        // Output must be durable before the ledger reports Completed
        self.storage
            .put(output, result.to_json_bytes()?, CONTENT_TYPE_JSON)
            .await?;

        let completed_key = key.with_checksum(summary.checksum.as_str());
        self.coordinator
            .mark_completed(&completed_key, output, &summary.checksum)
            .await?;

        Ok(result)
    }
}
